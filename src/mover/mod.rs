use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    input_api::{
        GenericIdleSensor, GenericInputInjector, IdleSensor, InputInjector, MovementMode,
        MovementOutcome,
    },
    utils::clock::{Clock, DefaultClock},
};

use engine::MovementEngine;
use gate::IdleGate;

pub mod engine;
pub mod gate;
pub mod shutdown;

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const IDLE_CHECK_PERIOD: Duration = Duration::from_secs(120);
const IDLE_THRESHOLD_SECONDS: u64 = 120;
const DEBOUNCE_SECONDS: u64 = 2;

/// Represents the starting point for the mover. Runs until the process is
/// interrupted or an OS query fails.
pub async fn start_mover(mode: MovementMode) -> Result<()> {
    let sensor = GenericIdleSensor::new()?;
    let injector = GenericInputInjector::new()?;

    let shutdown_token = CancellationToken::new();

    let driver = create_driver(mode, sensor, injector, &shutdown_token, DefaultClock);

    let (_, drive_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        driver.run(),
    );

    drive_result.inspect_err(|e| error!("Mover got an error {e:?}"))
}

fn create_driver(
    mode: MovementMode,
    sensor: impl IdleSensor + 'static,
    injector: impl InputInjector + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock + Clone,
) -> CadenceDriver {
    let engine = MovementEngine::new(
        Box::new(sensor),
        Box::new(injector),
        IdleGate::from_seconds(IDLE_THRESHOLD_SECONDS, DEBOUNCE_SECONDS),
        Box::new(clock.clone()),
    );
    CadenceDriver::new(
        engine,
        mode,
        shutdown_token.clone(),
        POLL_INTERVAL,
        IDLE_CHECK_PERIOD,
        Box::new(clock),
    )
}

/// Drives the engine on a fixed cadence: a short poll tick, escalating to an
/// idle check once enough poll time has accumulated. Original mode fires the
/// nudge as soon as its own check passes; minimal mode goes through the full
/// debounced gate.
pub struct CadenceDriver {
    engine: MovementEngine,
    mode: MovementMode,
    shutdown: CancellationToken,
    poll_interval: Duration,
    idle_check_period: Duration,
    clock: Box<dyn Clock>,
}

impl CadenceDriver {
    pub fn new(
        engine: MovementEngine,
        mode: MovementMode,
        shutdown: CancellationToken,
        poll_interval: Duration,
        idle_check_period: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            mode,
            shutdown,
            poll_interval,
            idle_check_period,
            clock,
        }
    }

    async fn escalate(&mut self) -> Result<()> {
        let idle = self.engine.idle_seconds()?;
        if !self.engine.gate().confirms_idle(idle) {
            info!("User is active, idle for {idle:.0}s");
            return Ok(());
        }

        match self.mode {
            MovementMode::Original => {
                // Idleness was confirmed a moment ago, fire without re-verification.
                self.engine.move_now(MovementMode::Original)?;
                info!("Executed visible nudge");
            }
            MovementMode::Minimal => {
                match self.engine.attempt_movement(MovementMode::Minimal).await? {
                    MovementOutcome::Executed => info!("Executed minimal nudge"),
                    MovementOutcome::Skipped => info!("User became active, nudge skipped"),
                }
            }
        }
        Ok(())
    }

    /// Executes the cadence event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        let mut accumulated = Duration::ZERO;
        loop {
            poll_point += self.poll_interval;
            accumulated += self.poll_interval;

            if accumulated >= self.idle_check_period {
                accumulated = Duration::ZERO;
                debug!("Idle check at {}", self.clock.time().format("%H:%M"));
                if let Err(e) = self.escalate().await {
                    error!("Encountered an error during movement {e:?}");
                    // Unblocks detect_shutdown so the process can exit.
                    self.shutdown.cancel();
                    return Err(e);
                }
            }

            tokio::select! {
                // Cancelation means we stop execution of the event loop.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}
