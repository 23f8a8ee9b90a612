use crate::clock::{format_dive_time, DiveClock, TimeSource};
use crate::command::{CommandSource, OperatorCommand};
use crate::config::SimConfig;
use crate::deco::{DecoModel, ModelSnapshot};
use crate::depth::{DepthIntegrator, DepthState};
use crate::link::{LinkError, TelemetryLink};
use crate::profile::{AxisExtents, ProfileRecorder, ProfileSample};
use crate::protocol::{encode_clock_sync, encode_depth_report};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Running,
    /// Terminal. Reached only through [`OperatorCommand::Quit`].
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryStatus {
    /// No device configured.
    Disabled,
    Connected,
    /// A device was configured but the link failed; simulation carries on
    /// without it.
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStats {
    pub ticks: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub commands_applied: u32,
    pub commands_ignored: u32,
}

/// What the console shows once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    pub dive_time_s: f64,
    pub current_depth: f64,
    pub target_depth: f64,
    pub rate_m_per_min: f64,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  depth {:6.1} m  target {:6.1} m  rate {:5.1} m/min",
            format_dive_time(self.dive_time_s),
            self.current_depth,
            self.target_depth,
            self.rate_m_per_min
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveSnapshot {
    pub dive_time_s: f64,
    pub depth: DepthState,
    pub state: DriverState,
    pub telemetry: TelemetryStatus,
    pub models: Vec<ModelSnapshot>,
    pub stats: DriverStats,
}

/// Runs the dive: one [`tick`](SimulationDriver::tick) advances depth, feeds
/// the models, reports to the device and applies at most one operator command.
pub struct SimulationDriver<S> {
    clock: DiveClock<S>,
    integrator: DepthIntegrator,
    models: Vec<Box<dyn DecoModel>>,
    link: Option<Box<dyn TelemetryLink>>,
    telemetry: TelemetryStatus,
    profile: Option<ProfileRecorder>,
    state: DriverState,
    stats: DriverStats,
}

impl<S: TimeSource> SimulationDriver<S> {
    pub fn new(config: &SimConfig, source: S) -> Self {
        let integrator = DepthIntegrator::with_target(
            config.dive.initial_target_depth_m,
            config.initial_rate_per_second(),
        );

        let models = config.models.iter().map(|kind| kind.build()).collect();

        let profile = config.plot.enabled.then(|| {
            ProfileRecorder::new(
                config.plot.sample_interval_s,
                config.plot.time_axis_step_min,
                config.plot.depth_axis_step_m,
            )
        });

        Self {
            clock: DiveClock::start(source),
            integrator,
            models,
            link: None,
            telemetry: TelemetryStatus::Disabled,
            profile,
            state: DriverState::Running,
            stats: DriverStats::default(),
        }
    }

    pub fn with_model(mut self, model: Box<dyn DecoModel>) -> Self {
        self.add_model(model);
        self
    }

    pub fn add_model(&mut self, model: Box<dyn DecoModel>) {
        info!("Decompression model enabled: {}", model.name());
        self.models.push(model);
    }

    /// Attaches the device and sends its clock sync. The sync goes out before
    /// any depth report; if it cannot be sent the device is treated as
    /// unavailable.
    pub fn attach_link(&mut self, mut link: Box<dyn TelemetryLink>, now: DateTime<Utc>) {
        let frame = encode_clock_sync(now);
        match link.send(&frame) {
            Ok(()) => {
                info!("⏱️  Clock sync sent: {}", frame.as_str());
                self.stats.frames_sent += 1;
                self.link = Some(link);
                self.telemetry = TelemetryStatus::Connected;
            }
            Err(e) => self.mark_telemetry_unavailable(&e),
        }
    }

    /// Declares that a configured device could not be opened at all.
    pub fn link_failed(&mut self, error: &LinkError) {
        self.mark_telemetry_unavailable(error);
    }

    /// Runs one tick. Returns `None` without doing anything once stopped.
    pub fn tick<I>(&mut self, input: &mut I) -> Option<StatusLine>
    where
        I: CommandSource + ?Sized,
    {
        if self.state == DriverState::Stopped {
            return None;
        }

        let elapsed = self.clock.tick();
        self.integrator.advance(elapsed);
        let depth = self.integrator.current_depth();

        for model in self.models.iter_mut() {
            model.update(depth, elapsed);
        }

        self.send_depth_report(depth);

        if let Some(profile) = self.profile.as_mut() {
            profile.record(self.clock.dive_time(), depth);
        }

        self.stats.ticks += 1;

        if let Some(line) = input.poll_line() {
            self.apply(OperatorCommand::parse(&line));
        }

        Some(self.status_line())
    }

    /// Applies a command. Returns whether it changed anything.
    pub fn apply(&mut self, command: OperatorCommand) -> bool {
        if self.state == DriverState::Stopped {
            return false;
        }

        let applied = match command {
            OperatorCommand::SetDepth(depth) => {
                let applied = self.integrator.set_target(depth);
                if applied {
                    info!("🎯 Target depth set to {:.1} m", depth);
                }
                applied
            }
            OperatorCommand::SetRate(rate) => {
                let applied = self.integrator.set_rate(rate);
                if applied {
                    info!("↕️  Rate set to {:.1} m/min", rate * 60.0);
                }
                applied
            }
            OperatorCommand::Quit => {
                info!("🛑 Quit received after {} ticks", self.stats.ticks);
                self.state = DriverState::Stopped;
                true
            }
            OperatorCommand::Malformed => false,
        };

        if applied {
            self.stats.commands_applied = self.stats.commands_applied.saturating_add(1);
        } else {
            debug!("Ignoring operator input: {:?}", command);
            self.stats.commands_ignored = self.stats.commands_ignored.saturating_add(1);
        }
        applied
    }

    fn send_depth_report(&mut self, depth: f64) {
        let result = match self.link.as_mut() {
            Some(link) => link.send(&encode_depth_report(depth)),
            None => return,
        };

        match result {
            Ok(()) => self.stats.frames_sent += 1,
            Err(e) if e.is_fatal() => self.mark_telemetry_unavailable(&e),
            Err(e) => {
                self.stats.frames_dropped += 1;
                debug!("Depth report dropped: {}", e);
            }
        }
    }

    fn mark_telemetry_unavailable(&mut self, error: &LinkError) {
        warn!("📴 Telemetry unavailable, continuing without device: {}", error);
        self.link = None;
        self.telemetry = TelemetryStatus::Unavailable;
    }

    pub fn status_line(&self) -> StatusLine {
        let depth = self.integrator.state();
        StatusLine {
            dive_time_s: self.clock.dive_time(),
            current_depth: depth.current_depth,
            target_depth: depth.target_depth,
            rate_m_per_min: depth.rate_per_minute(),
        }
    }

    pub fn snapshot(&self) -> DiveSnapshot {
        DiveSnapshot {
            dive_time_s: self.clock.dive_time(),
            depth: *self.integrator.state(),
            state: self.state,
            telemetry: self.telemetry,
            models: self
                .models
                .iter()
                .map(|model| ModelSnapshot {
                    model: model.name().to_string(),
                    compartments: model.snapshot(),
                })
                .collect(),
            stats: self.stats,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn depth(&self) -> &DepthState {
        self.integrator.state()
    }

    pub fn dive_time(&self) -> f64 {
        self.clock.dive_time()
    }

    pub fn telemetry_status(&self) -> TelemetryStatus {
        self.telemetry
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn models(&self) -> &[Box<dyn DecoModel>] {
        &self.models
    }

    pub fn profile(&self) -> Option<&ProfileRecorder> {
        self.profile.as_ref()
    }

    /// Profile samples recorded since the last call. Empty when plotting is off.
    pub fn take_profile_samples(&mut self) -> Vec<ProfileSample> {
        self.profile
            .as_mut()
            .map(ProfileRecorder::take_pending)
            .unwrap_or_default()
    }

    pub fn profile_axes(&self) -> Option<AxisExtents> {
        self.profile.as_ref().map(ProfileRecorder::axes)
    }
}
