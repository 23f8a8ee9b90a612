pub mod dummy;

pub use dummy::DummyModel;

use heapless::Vec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_COMPARTMENTS: usize = 16;

pub type CompartmentId = u8;
pub type CompartmentList = Vec<TissueCompartment, MAX_COMPARTMENTS>;

/// One unit of tissue gas loading with its own half-time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TissueCompartment {
    pub id: CompartmentId,
    pub half_time_s: f64,
    pub loading: f64,
}

impl TissueCompartment {
    /// Any half-time is accepted; see [`advance`](Self::advance) for how a
    /// non-positive one behaves.
    pub fn new(id: CompartmentId, half_time_s: f64) -> Self {
        Self {
            id,
            half_time_s,
            loading: 0.0,
        }
    }

    /// Moves the loading toward `equilibrium` following the half-time law:
    /// `eq + (loading - eq) * 2^(-elapsed / half_time)`.
    ///
    /// A half-time that is not positive (including NaN) equilibrates instantly.
    pub fn advance(&mut self, equilibrium: f64, elapsed_seconds: f64) {
        if elapsed_seconds.is_nan() || elapsed_seconds <= 0.0 {
            return;
        }

        let remaining = if self.half_time_s > 0.0 {
            (-elapsed_seconds / self.half_time_s).exp2()
        } else {
            0.0
        };

        self.loading = equilibrium + (self.loading - equilibrium) * remaining;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompartmentLoading {
    pub id: CompartmentId,
    pub loading: f64,
}

impl From<&TissueCompartment> for CompartmentLoading {
    fn from(compartment: &TissueCompartment) -> Self {
        Self {
            id: compartment.id,
            loading: compartment.loading,
        }
    }
}

/// Named snapshot of one model, as published to display collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub model: String,
    pub compartments: alloc::vec::Vec<CompartmentLoading>,
}

/// A decompression model fed with the simulated depth timeline.
///
/// Implementations must accept any finite depth and may own zero
/// compartments.
pub trait DecoModel: Send {
    fn name(&self) -> &str;

    /// Advances every compartment by `elapsed_seconds` at `current_depth`.
    fn update(&mut self, current_depth: f64, elapsed_seconds: f64);

    /// Read-only export of `(compartment_id, loading)` pairs.
    fn snapshot(&self) -> alloc::vec::Vec<CompartmentLoading>;
}

/// Models selectable from the command line or configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Dummy,
}

impl ModelKind {
    pub fn build(self) -> Box<dyn DecoModel> {
        match self {
            ModelKind::Dummy => Box::new(DummyModel::new()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Dummy => write!(f, "dummy"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dummy" => Ok(ModelKind::Dummy),
            _ => Err(UnknownModel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown decompression model: {0}")]
pub struct UnknownModel(pub String);
