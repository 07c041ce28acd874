
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::error;
use windows::Win32::{
    System::SystemInformation::GetTickCount64,
    UI::Input::KeyboardAndMouse::{
        GetLastInputInfo, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
        KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, LASTINPUTINFO, MOUSEEVENTF_MOVE, MOUSEINPUT,
        SendInput, VIRTUAL_KEY, VK_SHIFT,
    },
};

use super::{IdleSensor, InputInjector, SyntheticKey, animation_steps};

pub fn get_idle_seconds() -> Result<f64> {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        error!("Failed to retrieve user idle time");
        return Err(anyhow!("Failed to retrieve user idle time"));
    }

    let tick_count = unsafe { GetTickCount64() };
    let millis = tick_count.saturating_sub(last.dwTime as u64);
    Ok(millis as f64 / 1000.0)
}

fn send_batch(inputs: &[INPUT]) -> Result<()> {
    let sent = unsafe { SendInput(inputs, size_of::<INPUT>() as i32) };
    if sent != inputs.len() as u32 {
        error!("SendInput injected {sent} of {} events", inputs.len());
        return Err(anyhow!("Failed to inject synthetic input"));
    }
    Ok(())
}

fn pointer_step(dx: i32, dy: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: MOUSEEVENTF_MOVE,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn key_event(key: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: key,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

pub struct WindowsIdleSensor {}

impl WindowsIdleSensor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsIdleSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleSensor for WindowsIdleSensor {
    fn idle_seconds(&mut self) -> Result<f64> {
        get_idle_seconds().inspect_err(|e| error!("Failed to get idle time {e:?}"))
    }
}

pub struct WindowsInputInjector {}

impl WindowsInputInjector {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsInputInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for WindowsInputInjector {
    fn nudge_pointer(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<()> {
        let (steps, pause) = animation_steps(dx, dy, duration);
        for (step_x, step_y) in steps {
            send_batch(&[pointer_step(step_x, step_y)])?;
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
        Ok(())
    }

    fn tap_key(&mut self, key: SyntheticKey) -> Result<()> {
        let key = match key {
            SyntheticKey::Shift => VK_SHIFT,
        };
        send_batch(&[
            key_event(key, KEYBD_EVENT_FLAGS(0)),
            key_event(key, KEYEVENTF_KEYUP),
        ])
    }
}
