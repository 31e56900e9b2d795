//! The Closed/Open/HalfOpen state machine for a single lease.

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

/// The circuit's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// All calls admitted.
    Closed,
    /// All calls rejected until `expiry`.
    Open,
    /// Up to `max_half_open_requests` probes admitted.
    HalfOpen,
}

/// Configuration for a single breaker.
#[derive(Debug, Clone, Copy)]
pub struct CircuitConfig {
    /// Consecutive failures (in Closed) that trip the breaker open.
    pub consecutive_failure_threshold: u32,
    /// How long Open rejects calls before allowing a HalfOpen probe.
    pub open_timeout: Duration,
    /// Concurrent probes admitted while HalfOpen.
    pub max_half_open_requests: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            consecutive_failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            max_half_open_requests: 1,
        }
    }
}

/// An opaque token identifying the generation a call was admitted under.
/// Passed back to `record_success`/`record_failure` so a straggling result
/// from a stale generation cannot corrupt a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// The breaker rejected the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit is open")]
pub struct CircuitOpen;

struct Inner {
    state: State,
    generation: u64,
    consecutive_failures: u32,
    consecutive_successes: u32,
    half_open_in_flight: u32,
    expiry: Option<Instant>,
}

/// A single lease's circuit breaker.
pub struct Circuit {
    inner: Mutex<Inner>,
    config: CircuitConfig,
    on_transition: Option<Box<dyn Fn(State, State) + Send + Sync>>,
}

impl Circuit {
    /// Creates a new, closed circuit.
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Closed,
                generation: 0,
                consecutive_failures: 0,
                consecutive_successes: 0,
                half_open_in_flight: 0,
                expiry: None,
            }),
            config,
            on_transition: None,
        }
    }

    /// Creates a new circuit with a callback fired on every state change,
    /// used to drive the per-lease state gauge and transition counter.
    pub fn with_transition_callback(config: CircuitConfig, on_transition: impl Fn(State, State) + Send + Sync + 'static) -> Self {
        Self {
            on_transition: Some(Box::new(on_transition)),
            ..Self::new(config)
        }
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.inner.lock().unwrap().state
    }

    /// `(consecutive_failures, consecutive_successes)` in the current generation.
    pub fn counts(&self) -> (u32, u32) {
        let inner = self.inner.lock().unwrap();
        (inner.consecutive_failures, inner.consecutive_successes)
    }

    /// Resets the breaker to Closed, as an admin action.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.transition(&mut inner, State::Closed);
    }

    /// Attempts to admit a call. Returns the generation to record the
    /// outcome against, or `CircuitOpen` if rejected.
    pub fn try_acquire(&self) -> Result<Generation, CircuitOpen> {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();

        match inner.state {
            State::Closed => Ok(Generation(inner.generation)),
            State::Open => {
                if inner.expiry.is_some_and(|expiry| now >= expiry) {
                    self.transition(&mut inner, State::HalfOpen);
                    inner.half_open_in_flight += 1;
                    Ok(Generation(inner.generation))
                } else {
                    Err(CircuitOpen)
                }
            }
            State::HalfOpen => {
                if inner.half_open_in_flight < self.config.max_half_open_requests {
                    inner.half_open_in_flight += 1;
                    Ok(Generation(inner.generation))
                } else {
                    Err(CircuitOpen)
                }
            }
        }
    }

    /// Records a successful call admitted under `generation`. A no-op if the
    /// breaker has since moved to a different generation.
    pub fn record_success(&self, generation: Generation) {
        let mut inner = self.inner.lock().unwrap();

        if inner.generation != generation.0 {
            return;
        }

        inner.consecutive_failures = 0;
        inner.consecutive_successes += 1;

        if inner.state == State::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);

            if inner.consecutive_successes >= self.config.max_half_open_requests {
                self.transition(&mut inner, State::Closed);
            }
        }
    }

    /// Records a failed call admitted under `generation`. A no-op if the
    /// breaker has since moved to a different generation.
    pub fn record_failure(&self, generation: Generation) {
        let mut inner = self.inner.lock().unwrap();

        if inner.generation != generation.0 {
            return;
        }

        inner.consecutive_successes = 0;
        inner.consecutive_failures += 1;

        match inner.state {
            State::HalfOpen => {
                inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                self.transition(&mut inner, State::Open);
            }
            State::Closed if inner.consecutive_failures >= self.config.consecutive_failure_threshold => {
                self.transition(&mut inner, State::Open);
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: State) {
        if inner.state == to {
            return;
        }

        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.consecutive_failures = 0;
        inner.consecutive_successes = 0;
        inner.half_open_in_flight = 0;
        inner.expiry = (to == State::Open).then(|| Instant::now() + self.config.open_timeout);

        if let Some(callback) = &self.on_transition {
            callback(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CircuitConfig {
        CircuitConfig {
            consecutive_failure_threshold: 3,
            open_timeout: Duration::from_millis(20),
            max_half_open_requests: 2,
        }
    }

    #[test]
    fn trips_open_after_threshold_failures() {
        let circuit = Circuit::new(config());

        for _ in 0..3 {
            let gen = circuit.try_acquire().unwrap();
            circuit.record_failure(gen);
        }

        assert_eq!(circuit.state(), State::Open);
        assert!(circuit.try_acquire().is_err());
    }

    #[test]
    fn half_open_after_timeout_then_closes_on_success() {
        let circuit = Circuit::new(config());

        for _ in 0..3 {
            let gen = circuit.try_acquire().unwrap();
            circuit.record_failure(gen);
        }

        std::thread::sleep(Duration::from_millis(25));

        let gen1 = circuit.try_acquire().unwrap();
        assert_eq!(circuit.state(), State::HalfOpen);

        let gen2 = circuit.try_acquire().unwrap();
        circuit.record_success(gen1);
        circuit.record_success(gen2);

        assert_eq!(circuit.state(), State::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let circuit = Circuit::new(config());

        for _ in 0..3 {
            let gen = circuit.try_acquire().unwrap();
            circuit.record_failure(gen);
        }

        std::thread::sleep(Duration::from_millis(25));

        let gen = circuit.try_acquire().unwrap();
        circuit.record_failure(gen);

        assert_eq!(circuit.state(), State::Open);
    }

    #[test]
    fn stale_generation_result_is_ignored() {
        let circuit = Circuit::new(config());

        let stale = circuit.try_acquire().unwrap();
        circuit.record_failure(stale);
        circuit.record_failure(stale);
        circuit.record_failure(stale);

        assert_eq!(circuit.state(), State::Open);
        std::thread::sleep(Duration::from_millis(25));

        let _fresh = circuit.try_acquire().unwrap();
        assert_eq!(circuit.state(), State::HalfOpen);

        // A straggling failure from the tripped generation must not affect
        // the fresh HalfOpen generation's counters.
        circuit.record_failure(stale);
        assert_eq!(circuit.state(), State::HalfOpen);
    }

    #[test]
    fn reset_forces_closed() {
        let circuit = Circuit::new(config());

        for _ in 0..3 {
            let gen = circuit.try_acquire().unwrap();
            circuit.record_failure(gen);
        }
        assert_eq!(circuit.state(), State::Open);

        circuit.reset();
        assert_eq!(circuit.state(), State::Closed);
    }
}
