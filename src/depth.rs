use serde::{Deserialize, Serialize};
use tracing::debug;

/// Remaining gap (metres) below which the integrator snaps onto the target
/// instead of leaving floating-point residue.
pub const SNAP_EPSILON_M: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthState {
    pub current_depth: f64,
    pub target_depth: f64,
    /// Magnitude only, metres per second. Direction comes from the sign of
    /// `target_depth - current_depth`.
    pub rate: f64,
    pub max_depth_reached: f64,
}

impl DepthState {
    pub fn at_surface() -> Self {
        Self {
            current_depth: 0.0,
            target_depth: 0.0,
            rate: 0.0,
            max_depth_reached: 0.0,
        }
    }

    pub fn is_at_target(&self) -> bool {
        self.current_depth == self.target_depth
    }

    /// Rate converted back to metres per minute for display.
    pub fn rate_per_minute(&self) -> f64 {
        self.rate * 60.0
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::at_surface()
    }
}

/// Owns the diver's [`DepthState`] and moves it toward the target once per tick.
#[derive(Debug, Clone)]
pub struct DepthIntegrator {
    state: DepthState,
}

impl DepthIntegrator {
    pub fn new() -> Self {
        Self {
            state: DepthState::at_surface(),
        }
    }

    /// Starts at the surface heading for `target_depth` at `rate_per_second`.
    pub fn with_target(target_depth: f64, rate_per_second: f64) -> Self {
        let mut integrator = Self::new();
        integrator.set_target(target_depth);
        integrator.set_rate(rate_per_second);
        integrator
    }

    pub fn advance(&mut self, elapsed_seconds: f64) {
        debug_assert!(
            elapsed_seconds.is_nan() || elapsed_seconds >= 0.0,
            "Negative elapsed time {} passed to integrator",
            elapsed_seconds
        );
        let elapsed = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            elapsed_seconds
        } else {
            0.0
        };

        let gap = self.state.target_depth - self.state.current_depth;
        let step = self.state.rate * elapsed;
        if gap != 0.0 && step > 0.0 {
            if gap.abs() <= step + SNAP_EPSILON_M {
                self.state.current_depth = self.state.target_depth;
            } else {
                self.state.current_depth += gap.signum() * step;
            }
        }

        if self.state.current_depth > self.state.max_depth_reached {
            self.state.max_depth_reached = self.state.current_depth;
        }
    }

    /// Returns false and keeps the previous target if `depth` is not finite.
    pub fn set_target(&mut self, depth: f64) -> bool {
        if !depth.is_finite() {
            debug!("Ignoring non-finite target depth {}", depth);
            return false;
        }
        self.state.target_depth = depth;
        true
    }

    /// Stores the magnitude of `rate_per_second`. Returns false and keeps the
    /// previous rate if it is not finite.
    pub fn set_rate(&mut self, rate_per_second: f64) -> bool {
        if !rate_per_second.is_finite() {
            debug!("Ignoring non-finite rate {}", rate_per_second);
            return false;
        }
        self.state.rate = rate_per_second.abs();
        true
    }

    pub fn state(&self) -> &DepthState {
        &self.state
    }

    pub fn current_depth(&self) -> f64 {
        self.state.current_depth
    }
}

impl Default for DepthIntegrator {
    fn default() -> Self {
        Self::new()
    }
}
