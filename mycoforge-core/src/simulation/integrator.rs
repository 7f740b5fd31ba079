//! Fixed-step fourth-order Runge-Kutta integration.

use super::state::{SimulationSample, StateVector};
use crate::error::ModelError;
use tracing::{error, warn};

/// Smallest step the integrator will take, in days.
pub const MIN_TIME_STEP: f64 = 1e-6;

/// Largest number of steps a single run may plan.
pub const MAX_STEPS: usize = 10_000_000;

/// The step size and step count a run will actually use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    pub time_step: f64,
    pub num_steps: usize,
}

impl StepPlan {
    /// Floors the step to [`MIN_TIME_STEP`] and fits as many whole steps into `duration` as possible.
    pub fn new(duration: f64, time_step: f64) -> Self {
        let time_step = time_step.max(MIN_TIME_STEP);
        let duration = duration.max(0.0);
        // Float-to-int `as` saturates, so an absurd duration cannot wrap.
        let num_steps = (duration / time_step).floor() as usize;
        Self { time_step, num_steps }
    }

    /// Rejects plans longer than [`MAX_STEPS`].
    pub fn check(&self) -> Result<(), ModelError> {
        if self.num_steps > MAX_STEPS {
            return Err(ModelError::TooManySteps {
                requested: self.num_steps,
                limit: MAX_STEPS,
            });
        }
        Ok(())
    }
}

/// Why integration stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    Completed,
    NoSteps,
    /// The derivative function failed while computing step `step` (1-based).
    DerivativeFailed { step: usize, time: f64, error: ModelError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub samples: Vec<SimulationSample>,
    pub termination: Termination,
}

impl Trajectory {
    pub fn first_unstable(&self) -> Option<(usize, &SimulationSample)> {
        self.samples.iter().enumerate().find(|(_, s)| s.unstable)
    }

    pub fn steps_taken(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }
}

/// Advances `y` by one classic RK4 step of size `dt`.
pub fn rk4_step<F>(derivative: &F, t: f64, y: &StateVector, dt: f64) -> Result<StateVector, ModelError>
where
    F: Fn(&StateVector, f64) -> Result<StateVector, ModelError>,
{
    let half = dt / 2.0;
    let k1 = derivative(y, t)?;
    let k2 = derivative(&y.add_scaled(&k1, half), t + half)?;
    let k3 = derivative(&y.add_scaled(&k2, half), t + half)?;
    let k4 = derivative(&y.add_scaled(&k3, dt), t + dt)?;

    let (y, k1, k2, k3, k4) = (y.to_array(), k1.to_array(), k2.to_array(), k3.to_array(), k4.to_array());
    Ok(StateVector::from_array(std::array::from_fn(|i| {
        y[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i])
    })))
}

/// Integrates from `initial` at `t0` for `num_steps` steps of size `dt`.
///
/// The first sample is always the initial state. Non-finite samples are
/// flagged and integration carries on; a failing derivative ends the
/// trajectory at the last good sample.
pub fn integrate<F>(initial: StateVector, derivative: F, t0: f64, dt: f64, num_steps: usize) -> Trajectory
where
    F: Fn(&StateVector, f64) -> Result<StateVector, ModelError>,
{
    let mut samples = Vec::with_capacity(num_steps.min(MAX_STEPS).saturating_add(1));
    samples.push(SimulationSample::new(t0, initial));

    if num_steps == 0 {
        return Trajectory {
            samples,
            termination: Termination::NoSteps,
        };
    }

    let mut y = initial;
    let mut t = t0;
    let mut reported_instability = false;

    for step in 1..=num_steps {
        y = match rk4_step(&derivative, t, &y, dt) {
            Ok(next) => next,
            Err(err) => {
                error!(step, time = t, error = %err, "derivative evaluation failed, truncating trajectory");
                return Trajectory {
                    samples,
                    termination: Termination::DerivativeFailed { step, time: t, error: err },
                };
            }
        };
        // Recompute from the step index so time does not drift over long runs.
        t = t0 + step as f64 * dt;

        let sample = SimulationSample::new(t, y);
        if sample.unstable && !reported_instability {
            warn!(step, time = t, "state became non-finite or a pool went negative; continuing integration");
            reported_instability = true;
        }
        samples.push(sample);
    }

    Trajectory {
        samples,
        termination: Termination::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay(rate: f64) -> impl Fn(&StateVector, f64) -> Result<StateVector, ModelError> {
        move |y: &StateVector, _t: f64| {
            Ok(StateVector::from_array(y.to_array().map(|v| -rate * v)))
        }
    }

    fn ones() -> StateVector {
        StateVector::from_array([1.0; StateVector::LEN])
    }

    #[test]
    fn test_step_plan_floors_step_count() {
        assert_eq!(StepPlan::new(40.0, 0.2), StepPlan { time_step: 0.2, num_steps: 200 });
        assert_eq!(StepPlan::new(1.0, 0.3).num_steps, 3);
    }

    #[test]
    fn test_step_plan_degenerate_inputs() {
        assert_eq!(StepPlan::new(0.0, 0.2).num_steps, 0);
        assert_eq!(StepPlan::new(-5.0, 0.2).num_steps, 0);
        assert_eq!(StepPlan::new(0.1, 0.2).num_steps, 0);
        assert_eq!(StepPlan::new(1.0, 0.0).time_step, MIN_TIME_STEP);
        assert_eq!(StepPlan::new(1.0, -3.0).time_step, MIN_TIME_STEP);
        assert_eq!(StepPlan::new(f64::NAN, 0.2).num_steps, 0);
    }

    #[test]
    fn test_step_plan_rejects_runaway_lengths() {
        assert_eq!(StepPlan::new(100.0, 0.2).check(), Ok(()));

        let infinite = StepPlan::new(f64::INFINITY, 0.2);
        assert_eq!(infinite.num_steps, usize::MAX);
        assert!(matches!(infinite.check(), Err(ModelError::TooManySteps { .. })));
        assert!(StepPlan::new(1.0e12, 0.2).check().is_err());
    }

    #[test]
    fn test_zero_steps_returns_initial_sample() {
        let trajectory = integrate(ones(), decay(1.0), 0.0, 0.1, 0);
        assert_eq!(trajectory.samples.len(), 1);
        assert_eq!(trajectory.samples[0].state, ones());
        assert_eq!(trajectory.termination, Termination::NoSteps);
    }

    #[test]
    fn test_rk4_matches_exponential_decay() {
        let trajectory = integrate(ones(), decay(1.0), 0.0, 0.1, 10);
        assert_eq!(trajectory.samples.len(), 11);
        assert_eq!(trajectory.termination, Termination::Completed);

        let last = trajectory.samples.last().unwrap();
        assert!((last.time - 1.0).abs() < 1e-12);
        assert!((last.state.co2 - (-1.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_single_step_uses_rk4_weights() {
        // For y' = -y the RK4 update is the 4th order Taylor polynomial of e^-h.
        let h = 0.5;
        let next = rk4_step(&decay(1.0), 0.0, &ones(), h).unwrap();
        let expected = 1.0 - h + h * h / 2.0 - h * h * h / 6.0 + h * h * h * h / 24.0;
        assert!((next.nitrogen - expected).abs() < 1e-12);
    }

    #[test]
    fn test_time_axis_is_evenly_spaced() {
        let trajectory = integrate(ones(), decay(0.5), 2.0, 0.25, 8);
        for (i, sample) in trajectory.samples.iter().enumerate() {
            assert_eq!(sample.time, 2.0 + i as f64 * 0.25);
        }
    }

    #[test]
    fn test_non_finite_state_is_flagged_and_integration_continues() {
        let blow_up = |y: &StateVector, _t: f64| -> Result<StateVector, ModelError> {
            Ok(StateVector::from_array(y.to_array().map(|v| v * 1.0e200)))
        };
        let trajectory = integrate(ones(), blow_up, 0.0, 1.0, 5);
        assert_eq!(trajectory.samples.len(), 6);
        assert_eq!(trajectory.termination, Termination::Completed);
        let (index, _) = trajectory.first_unstable().unwrap();
        assert!(index >= 1);
        assert!(!trajectory.samples[0].unstable);
    }

    #[test]
    fn test_derivative_failure_truncates_at_last_good_sample() {
        let failing = |y: &StateVector, t: f64| -> Result<StateVector, ModelError> {
            if t >= 0.3 {
                Err(ModelError::EmptyCurve("co2_effect_on_mushroom"))
            } else {
                Ok(StateVector::from_array(y.to_array().map(|v| -v)))
            }
        };
        let trajectory = integrate(ones(), failing, 0.0, 0.1, 10);

        // Step 3 evaluates at t = 0.2 + 0.1 and fails, so samples at t = 0, 0.1, 0.2 survive.
        assert_eq!(trajectory.samples.len(), 3);
        match trajectory.termination {
            Termination::DerivativeFailed { step, ref error, .. } => {
                assert_eq!(step, 3);
                assert_eq!(*error, ModelError::EmptyCurve("co2_effect_on_mushroom"));
            }
            ref other => panic!("unexpected termination: {other:?}"),
        }
        assert!(trajectory.samples.iter().all(|s| s.state.is_finite()));
    }
}
