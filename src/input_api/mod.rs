//! Platform access for the two capabilities the mover needs: reading how
//! long the user has been inactive and injecting synthetic input.
//! [GenericIdleSensor] and [GenericInputInjector] abstract over the
//! supported environments.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::time::Duration;

use anyhow::Result;

/// How the pointer is nudged once idleness is confirmed. Selected once at
/// startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementMode {
    /// Visible two-step nudge: 5 units right and back, animated.
    Original,
    /// Single 1-unit instantaneous nudge.
    Minimal,
}

/// Result of a safety-gated movement attempt. A skip is a normal outcome,
/// not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOutcome {
    Executed,
    Skipped,
}

/// Keys that are harmless to tap. A modifier tap changes nothing on screen
/// but still registers as input with the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    Shift,
}

/// Read-only view of the operating system's record of the last physical
/// input event, from any source and any process.
#[cfg_attr(test, mockall::automock)]
pub trait IdleSensor {
    /// Seconds since the user last moved the mouse or pressed a key,
    /// anywhere on the system. Queried fresh on every call.
    fn idle_seconds(&mut self) -> Result<f64>;
}

/// Synthetic input injection. Both operations are globally visible side
/// effects, indistinguishable at the OS level from hardware input.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector {
    /// Moves the pointer by a relative delta, spread over `duration` in
    /// fixed-interval steps. A zero duration moves in one step. The OS may
    /// clamp the motion at a screen edge.
    fn nudge_pointer(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<()>;

    /// Presses and immediately releases a key.
    fn tap_key(&mut self, key: SyntheticKey) -> Result<()>;
}

/// Serves as a cross-compatible IdleSensor implementation.
pub struct GenericIdleSensor {
    inner: Box<dyn IdleSensor>,
}

impl GenericIdleSensor {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsIdleSensor;
                Ok(Self {
                    inner: Box::new(WindowsIdleSensor::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxIdleSensor;
                Ok(Self {
                    inner: Box::new(LinuxIdleSensor::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No idle sensor was specified")
            }
        }
    }
}

impl IdleSensor for GenericIdleSensor {
    fn idle_seconds(&mut self) -> Result<f64> {
        self.inner.idle_seconds()
    }
}

/// Serves as a cross-compatible InputInjector implementation.
pub struct GenericInputInjector {
    inner: Box<dyn InputInjector>,
}

impl GenericInputInjector {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsInputInjector;
                Ok(Self {
                    inner: Box::new(WindowsInputInjector::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxInputInjector;
                Ok(Self {
                    inner: Box::new(LinuxInputInjector::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No input injector was specified")
            }
        }
    }
}

impl InputInjector for GenericInputInjector {
    fn nudge_pointer(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<()> {
        self.inner.nudge_pointer(dx, dy, duration)
    }

    fn tap_key(&mut self, key: SyntheticKey) -> Result<()> {
        self.inner.tap_key(key)
    }
}

/// Interval between the individual motion events of an animated nudge.
const ANIMATION_STEP: Duration = Duration::from_millis(10);

/// Splits a pointer delta into per-event movements spread over `duration`,
/// returning the steps together with the pause to insert between them. A zero
/// duration collapses to a single instantaneous step. The step deltas always
/// sum to the requested delta.
pub fn animation_steps(dx: i32, dy: i32, duration: Duration) -> (Vec<(i32, i32)>, Duration) {
    let span = dx.abs().max(dy.abs()).max(1);
    let count = ((duration.as_millis() / ANIMATION_STEP.as_millis()) as i32).clamp(1, span);
    if count == 1 {
        return (vec![(dx, dy)], Duration::ZERO);
    }

    let mut steps = Vec::with_capacity(count as usize);
    let (mut moved_x, mut moved_y) = (0, 0);
    for step in 1..=count {
        let target_x = dx * step / count;
        let target_y = dy * step / count;
        steps.push((target_x - moved_x, target_y - moved_y));
        (moved_x, moved_y) = (target_x, target_y);
    }
    (steps, duration / count as u32)
}
