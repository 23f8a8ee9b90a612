//! # Dive Simulator
//!
//! Simulates a diver's depth over time and drives an external dive computer
//! with it over a write-only serial link, optionally running decompression
//! models alongside.
//!
//! ## Features
//!
//! - **Depth integration**: moves toward a commanded target at a commanded
//!   rate, snapping exactly onto the target on arrival
//! - **Decompression models**: pluggable tissue-loading models fed with the
//!   depth timeline
//! - **Device telemetry**: `T`/`D` line protocol with clock sync and
//!   decimetre depth reports
//! - **Operator commands**: `set depth`, `set rate`, `quit`
//! - **Profile recording**: time/depth samples and axis extents for plotting
//!
//! ## Quick Start
//!
//! ```rust
//! use divesim::clock::ManualTimeSource;
//! use divesim::command::NoInput;
//! use divesim::config::SimConfig;
//! use divesim::driver::SimulationDriver;
//!
//! let time = ManualTimeSource::new(0.0);
//! let mut driver = SimulationDriver::new(&SimConfig::default(), time.clone());
//!
//! time.advance(37.5);
//! if let Some(status) = driver.tick(&mut NoInput) {
//!     println!("{}", status);
//! }
//! assert_eq!(driver.depth().current_depth, 5.0);
//! ```
//!
//! ## Architecture
//!
//! - [`driver`] - Tick loop orchestrating everything below
//! - [`depth`] - Depth integrator
//! - [`deco`] - Decompression model interface and the dummy model
//! - [`protocol`] - Device wire frames
//! - [`link`] - Non-blocking device transport
//! - [`command`] - Operator command parsing
//! - [`clock`] - Monotonic tick clock
//! - [`profile`] - Profile samples for plotting
//! - [`config`] - Session configuration

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod clock;
pub mod command;
pub mod config;
pub mod deco;
pub mod depth;
pub mod driver;
pub mod link;
pub mod logging;
pub mod profile;
pub mod protocol;

// Re-export main public types for convenience
pub use command::OperatorCommand;
pub use config::SimConfig;
pub use deco::{DecoModel, DummyModel};
pub use depth::{DepthIntegrator, DepthState};
pub use driver::{DriverState, SimulationDriver};
pub use protocol::TelemetryFrame;
