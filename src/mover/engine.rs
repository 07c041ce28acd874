use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::{
    input_api::{IdleSensor, InputInjector, MovementMode, MovementOutcome, SyntheticKey},
    utils::clock::Clock,
};

use super::gate::IdleGate;

/// Horizontal distance of the visible nudge, in pointer units.
const ORIGINAL_NUDGE_DISTANCE: i32 = 5;
const MINIMAL_NUDGE_DISTANCE: i32 = 1;
/// Animation time for each leg of the visible nudge.
const ORIGINAL_NUDGE_ANIMATION: Duration = Duration::from_millis(250);

/// Performs nudges, by default behind a two-phase idleness check. A single
/// idle reading races with the user resuming work an instant later; reading
/// twice with a real-time wait in between turns the point measurement into a
/// verified interval of sustained idleness.
pub struct MovementEngine {
    sensor: Box<dyn IdleSensor>,
    injector: Box<dyn InputInjector>,
    gate: IdleGate,
    clock: Box<dyn Clock>,
}

impl MovementEngine {
    pub fn new(
        sensor: Box<dyn IdleSensor>,
        injector: Box<dyn InputInjector>,
        gate: IdleGate,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            sensor,
            injector,
            gate,
            clock,
        }
    }

    pub fn gate(&self) -> &IdleGate {
        &self.gate
    }

    /// Fresh reading of how long the user has been inactive, in seconds.
    pub fn idle_seconds(&mut self) -> Result<f64> {
        self.sensor.idle_seconds()
    }

    /// Nudges the pointer only if the user is confirmed idle across the whole
    /// debounce window. Every skip is an expected outcome and leaves the
    /// system untouched.
    pub async fn attempt_movement(&mut self, mode: MovementMode) -> Result<MovementOutcome> {
        let idle = self.sensor.idle_seconds()?;
        if !self.gate.confirms_idle(idle) {
            debug!("Skipping, user was idle for only {idle:.1}s");
            return Ok(MovementOutcome::Skipped);
        }

        self.clock.sleep(self.gate.debounce()).await;

        let idle = self.sensor.idle_seconds()?;
        if !self.gate.confirms_sustained_idle(idle) {
            debug!("Skipping, user became active during the debounce window");
            return Ok(MovementOutcome::Skipped);
        }

        self.move_now(mode)?;
        Ok(MovementOutcome::Executed)
    }

    /// Performs the movement pattern immediately, without any idleness check.
    /// For callers that have already established idleness by other means.
    pub fn move_now(&mut self, mode: MovementMode) -> Result<()> {
        match mode {
            MovementMode::Original => {
                self.injector.nudge_pointer(
                    ORIGINAL_NUDGE_DISTANCE,
                    0,
                    ORIGINAL_NUDGE_ANIMATION,
                )?;
                self.injector.nudge_pointer(
                    -ORIGINAL_NUDGE_DISTANCE,
                    0,
                    ORIGINAL_NUDGE_ANIMATION,
                )?;
            }
            MovementMode::Minimal => {
                self.injector
                    .nudge_pointer(MINIMAL_NUDGE_DISTANCE, 0, Duration::ZERO)?;
            }
        }
        self.injector.tap_key(SyntheticKey::Shift)
    }
}

#[cfg(test)]
mod engine_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mockall::{Sequence, predicate::eq};
    use tokio::time::Instant;

    use crate::{
        input_api::{
            MockIdleSensor, MockInputInjector, MovementMode, MovementOutcome, SyntheticKey,
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::{IdleGate, MovementEngine};

    /// Returns from sleeps instantly while recording how long the caller
    /// asked to wait.
    #[derive(Clone)]
    struct RecordingClock {
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingClock {
        fn new() -> Self {
            Self {
                sleeps: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn recorded_sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for RecordingClock {
        fn time(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }

        async fn sleep_until(&self, _instant: Instant) {}
    }

    fn build_engine(
        sensor: MockIdleSensor,
        injector: MockInputInjector,
        clock: RecordingClock,
    ) -> MovementEngine {
        MovementEngine::new(
            Box::new(sensor),
            Box::new(injector),
            IdleGate::from_seconds(120, 2),
            Box::new(clock),
        )
    }

    #[tokio::test]
    async fn skips_without_debounce_when_user_is_active() -> Result<()> {
        *TEST_LOGGING;
        let mut sensor = MockIdleSensor::new();
        sensor.expect_idle_seconds().times(1).returning(|| Ok(0.0));
        let mut injector = MockInputInjector::new();
        injector.expect_nudge_pointer().times(0);
        injector.expect_tap_key().times(0);
        let clock = RecordingClock::new();

        let mut engine = build_engine(sensor, injector, clock.clone());
        let outcome = engine.attempt_movement(MovementMode::Minimal).await?;

        assert_eq!(outcome, MovementOutcome::Skipped);
        assert!(clock.recorded_sleeps().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn skips_when_activity_resumes_during_debounce() -> Result<()> {
        *TEST_LOGGING;
        let mut sensor = MockIdleSensor::new();
        let mut seq = Sequence::new();
        sensor
            .expect_idle_seconds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(150.0));
        // A keypress during the debounce window reset the idle counter.
        sensor
            .expect_idle_seconds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(0.5));
        let mut injector = MockInputInjector::new();
        injector.expect_nudge_pointer().times(0);
        injector.expect_tap_key().times(0);
        let clock = RecordingClock::new();

        let mut engine = build_engine(sensor, injector, clock.clone());
        let outcome = engine.attempt_movement(MovementMode::Original).await?;

        assert_eq!(outcome, MovementOutcome::Skipped);
        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(2)]);
        Ok(())
    }

    #[tokio::test]
    async fn executes_after_sustained_idleness() -> Result<()> {
        *TEST_LOGGING;
        let mut sensor = MockIdleSensor::new();
        sensor.expect_idle_seconds().times(2).returning(|| Ok(200.0));
        let mut injector = MockInputInjector::new();
        injector
            .expect_nudge_pointer()
            .with(eq(1), eq(0), eq(Duration::ZERO))
            .times(1)
            .returning(|_, _, _| Ok(()));
        injector
            .expect_tap_key()
            .with(eq(SyntheticKey::Shift))
            .times(1)
            .returning(|_| Ok(()));
        let clock = RecordingClock::new();

        let mut engine = build_engine(sensor, injector, clock.clone());
        let outcome = engine.attempt_movement(MovementMode::Minimal).await?;

        assert_eq!(outcome, MovementOutcome::Executed);
        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(2)]);
        Ok(())
    }

    #[tokio::test]
    async fn boundary_idle_durations_pass_both_checks() -> Result<()> {
        *TEST_LOGGING;
        let mut sensor = MockIdleSensor::new();
        let mut seq = Sequence::new();
        sensor
            .expect_idle_seconds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(120.0));
        sensor
            .expect_idle_seconds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(122.0));
        let mut injector = MockInputInjector::new();
        injector
            .expect_nudge_pointer()
            .times(1)
            .returning(|_, _, _| Ok(()));
        injector.expect_tap_key().times(1).returning(|_| Ok(()));

        let mut engine = build_engine(sensor, injector, RecordingClock::new());
        let outcome = engine.attempt_movement(MovementMode::Minimal).await?;

        assert_eq!(outcome, MovementOutcome::Executed);
        Ok(())
    }

    #[tokio::test]
    async fn repeated_attempts_move_every_time() -> Result<()> {
        *TEST_LOGGING;
        let mut sensor = MockIdleSensor::new();
        sensor.expect_idle_seconds().times(4).returning(|| Ok(500.0));
        let mut injector = MockInputInjector::new();
        injector
            .expect_nudge_pointer()
            .times(2)
            .returning(|_, _, _| Ok(()));
        injector.expect_tap_key().times(2).returning(|_| Ok(()));
        let clock = RecordingClock::new();

        let mut engine = build_engine(sensor, injector, clock.clone());
        for _ in 0..2 {
            let outcome = engine.attempt_movement(MovementMode::Minimal).await?;
            assert_eq!(outcome, MovementOutcome::Executed);
        }

        assert_eq!(clock.recorded_sleeps().len(), 2);
        Ok(())
    }

    #[test]
    fn move_now_original_moves_out_and_back_without_sensing() -> Result<()> {
        *TEST_LOGGING;
        // No expectations on the sensor, any idle query panics the test.
        let sensor = MockIdleSensor::new();
        let mut injector = MockInputInjector::new();
        let mut seq = Sequence::new();
        injector
            .expect_nudge_pointer()
            .with(eq(5), eq(0), eq(Duration::from_millis(250)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        injector
            .expect_nudge_pointer()
            .with(eq(-5), eq(0), eq(Duration::from_millis(250)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        injector
            .expect_tap_key()
            .with(eq(SyntheticKey::Shift))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut engine = build_engine(sensor, injector, RecordingClock::new());
        engine.move_now(MovementMode::Original)?;
        Ok(())
    }

    #[test]
    fn move_now_minimal_never_checks_idleness() -> Result<()> {
        *TEST_LOGGING;
        let sensor = MockIdleSensor::new();
        let mut injector = MockInputInjector::new();
        injector
            .expect_nudge_pointer()
            .with(eq(1), eq(0), eq(Duration::ZERO))
            .times(1)
            .returning(|_, _, _| Ok(()));
        injector.expect_tap_key().times(1).returning(|_| Ok(()));

        let mut engine = build_engine(sensor, injector, RecordingClock::new());
        engine.move_now(MovementMode::Minimal)?;
        Ok(())
    }
}
