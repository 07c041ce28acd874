use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::instrument;
use xcb::{
    Connection, Xid,
    screensaver::{QueryInfo, QueryInfoReply},
    x::{self, Drawable, GetKeyboardMapping, Window},
    xtest::FakeInput,
};

use super::{IdleSensor, InputInjector, SyntheticKey, animation_steps};

// Core protocol event opcodes accepted by XTestFakeInput.
const KEY_PRESS: u8 = 2;
const KEY_RELEASE: u8 = 3;
const MOTION_NOTIFY: u8 = 6;
// A non-zero detail marks MotionNotify coordinates as relative.
const RELATIVE_MOTION: u8 = 1;

const SHIFT_L_KEYSYM: x::Keysym = 0xffe1;

pub struct LinuxIdleSensor {
    connection: Connection,
    preferred_screen: i32,
}

impl LinuxIdleSensor {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = Connection::connect(None)?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }
}

impl IdleSensor for LinuxIdleSensor {
    #[instrument(skip(self))]
    fn idle_seconds(&mut self) -> Result<f64> {
        let setup = self.connection.get_setup();
        let root = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .ok_or_else(|| anyhow!("Preferred x11 screen does not exist"))?
            .root();
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(reply.ms_since_user_input() as f64 / 1000.0)
    }
}

/// The server is free to lay keycodes out however it wants, so the keycode
/// for Shift has to be resolved from the keysym table.
fn find_shift_keycode(conn: &Connection) -> Result<x::Keycode> {
    let setup = conn.get_setup();
    let min_keycode = setup.min_keycode();
    let count = setup.max_keycode() - min_keycode + 1;
    let reply = conn.wait_for_reply(conn.send_request(&GetKeyboardMapping {
        first_keycode: min_keycode,
        count,
    }))?;
    let per_keycode = reply.keysyms_per_keycode() as usize;
    for (index, keysyms) in reply.keysyms().chunks(per_keycode).enumerate() {
        if keysyms.contains(&SHIFT_L_KEYSYM) {
            return Ok(min_keycode + index as x::Keycode);
        }
    }
    Err(anyhow!("No keycode maps to Shift_L"))
}

pub struct LinuxInputInjector {
    connection: Connection,
    shift_keycode: x::Keycode,
}

impl LinuxInputInjector {
    pub fn new() -> Result<Self> {
        let (connection, _) = Connection::connect(None)?;
        let shift_keycode = find_shift_keycode(&connection)?;
        Ok(Self {
            connection,
            shift_keycode,
        })
    }

    fn fake_input(&self, kind: u8, detail: u8, dx: i16, dy: i16) -> Result<()> {
        self.connection.send_and_check_request(&FakeInput {
            r#type: kind,
            detail,
            time: x::CURRENT_TIME,
            root: Window::none(),
            root_x: dx,
            root_y: dy,
            deviceid: 0,
        })?;
        Ok(())
    }
}

impl InputInjector for LinuxInputInjector {
    #[instrument(skip(self))]
    fn nudge_pointer(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<()> {
        let (steps, pause) = animation_steps(dx, dy, duration);
        for (step_x, step_y) in steps {
            self.fake_input(MOTION_NOTIFY, RELATIVE_MOTION, step_x as i16, step_y as i16)?;
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
        Ok(())
    }

    fn tap_key(&mut self, key: SyntheticKey) -> Result<()> {
        let keycode = match key {
            SyntheticKey::Shift => self.shift_keycode,
        };
        self.fake_input(KEY_PRESS, keycode, 0, 0)?;
        self.fake_input(KEY_RELEASE, keycode, 0, 0)
    }
}
