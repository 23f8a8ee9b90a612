use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_INTERVAL_S: f64 = 0.25;
pub const DEFAULT_TIME_AXIS_STEP_MIN: f64 = 5.0;
pub const DEFAULT_DEPTH_AXIS_STEP_M: f64 = 5.0;

/// One point of the depth profile handed to the plotting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    pub elapsed_seconds: f64,
    pub depth: f64,
}

/// Axis limits for a profile plot, grown in whole steps as the dive goes on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtents {
    pub time_max_minutes: f64,
    pub depth_max_m: f64,
}

/// Decimates the tick stream into profile samples at a fixed cadence.
#[derive(Debug, Clone)]
pub struct ProfileRecorder {
    sample_interval_s: f64,
    time_axis_step_min: f64,
    depth_axis_step_m: f64,
    samples: Vec<ProfileSample>,
    pending: usize,
    last_sample_time: f64,
    max_depth: f64,
}

impl ProfileRecorder {
    /// The profile always starts at the surface at time zero.
    pub fn new(sample_interval_s: f64, time_axis_step_min: f64, depth_axis_step_m: f64) -> Self {
        let origin = ProfileSample {
            elapsed_seconds: 0.0,
            depth: 0.0,
        };
        Self {
            sample_interval_s: sample_interval_s.max(0.0),
            time_axis_step_min: positive_or(time_axis_step_min, DEFAULT_TIME_AXIS_STEP_MIN),
            depth_axis_step_m: positive_or(depth_axis_step_m, DEFAULT_DEPTH_AXIS_STEP_M),
            samples: vec![origin],
            pending: 1,
            last_sample_time: 0.0,
            max_depth: 0.0,
        }
    }

    /// Records a sample if at least one interval has passed since the last one.
    pub fn record(&mut self, elapsed_seconds: f64, depth: f64) -> Option<ProfileSample> {
        if depth > self.max_depth {
            self.max_depth = depth;
        }

        if elapsed_seconds - self.sample_interval_s < self.last_sample_time {
            return None;
        }

        let sample = ProfileSample {
            elapsed_seconds,
            depth,
        };
        self.samples.push(sample);
        self.pending += 1;
        self.last_sample_time = elapsed_seconds;
        Some(sample)
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    /// Samples recorded since the previous call, for streaming consumers.
    pub fn take_pending(&mut self) -> Vec<ProfileSample> {
        let start = self.samples.len() - self.pending;
        self.pending = 0;
        self.samples[start..].to_vec()
    }

    /// Time axis rounded up to whole time steps; depth axis to whole depth
    /// steps, never less than one step.
    pub fn axes(&self) -> AxisExtents {
        let last_minutes = self
            .samples
            .last()
            .map_or(0.0, |s| s.elapsed_seconds / 60.0);
        let time_steps = (last_minutes / self.time_axis_step_min).ceil().max(1.0);
        let depth_steps = (self.max_depth / self.depth_axis_step_m).max(1.0).ceil();

        AxisExtents {
            time_max_minutes: self.time_axis_step_min * time_steps,
            depth_max_m: self.depth_axis_step_m * depth_steps,
        }
    }
}

impl Default for ProfileRecorder {
    fn default() -> Self {
        Self::new(
            DEFAULT_SAMPLE_INTERVAL_S,
            DEFAULT_TIME_AXIS_STEP_MIN,
            DEFAULT_DEPTH_AXIS_STEP_M,
        )
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_starts_at_origin() {
        let recorder = ProfileRecorder::default();
        assert_eq!(recorder.samples().len(), 1);
        assert_eq!(recorder.samples()[0].elapsed_seconds, 0.0);
        assert_eq!(recorder.samples()[0].depth, 0.0);
    }

    #[test]
    fn test_recorder_honours_cadence() {
        let mut recorder = ProfileRecorder::default();

        assert!(recorder.record(0.1, 0.5).is_none());
        assert!(recorder.record(0.2, 0.6).is_none());
        assert!(recorder.record(0.25, 0.7).is_some());
        assert!(recorder.record(0.4, 0.8).is_none());
        assert!(recorder.record(0.5, 0.9).is_some());

        assert_eq!(recorder.samples().len(), 3);
    }

    #[test]
    fn test_take_pending_drains_new_samples_only() {
        let mut recorder = ProfileRecorder::default();
        recorder.record(1.0, 1.0);

        let first = recorder.take_pending();
        assert_eq!(first.len(), 2);

        recorder.record(2.0, 2.0);
        let second = recorder.take_pending();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].elapsed_seconds, 2.0);

        assert!(recorder.take_pending().is_empty());
        assert_eq!(recorder.samples().len(), 3);
    }

    #[test]
    fn test_axes_round_up_to_steps() {
        let mut recorder = ProfileRecorder::new(0.25, 5.0, 5.0);

        let axes = recorder.axes();
        assert_eq!(axes.time_max_minutes, 5.0);
        assert_eq!(axes.depth_max_m, 5.0);

        recorder.record(6.0 * 60.0, 12.0);
        let axes = recorder.axes();
        assert_eq!(axes.time_max_minutes, 10.0);
        assert_eq!(axes.depth_max_m, 15.0);

        // Max depth sticks after ascending
        recorder.record(7.0 * 60.0, 3.0);
        assert_eq!(recorder.axes().depth_max_m, 15.0);
    }
}
