use super::{CompartmentId, CompartmentList, CompartmentLoading, DecoModel, TissueCompartment};
use heapless::Vec;

pub const DUMMY_HALF_TIME_S: f64 = 15.0;

/// Placeholder single-compartment model.
///
/// Equilibrium loading is the current depth in metres. This has no basis in
/// real physiology and must never be used for dive planning or execution.
#[derive(Debug, Clone)]
pub struct DummyModel {
    compartments: CompartmentList,
}

impl DummyModel {
    pub fn new() -> Self {
        Self::with_half_times(&[DUMMY_HALF_TIME_S])
    }

    /// No compartments; every update is a no-op.
    pub fn empty() -> Self {
        Self {
            compartments: Vec::new(),
        }
    }

    /// One compartment per half-time, numbered from zero. Half-times beyond
    /// the compartment capacity are dropped.
    pub fn with_half_times(half_times_s: &[f64]) -> Self {
        let mut compartments = CompartmentList::new();
        for (index, &half_time) in half_times_s.iter().enumerate() {
            let compartment = TissueCompartment::new(index as CompartmentId, half_time);
            if compartments.push(compartment).is_err() {
                break;
            }
        }
        Self { compartments }
    }

    fn equilibrium(current_depth: f64) -> f64 {
        current_depth
    }

    pub fn compartments(&self) -> &[TissueCompartment] {
        &self.compartments
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    fn update(&mut self, current_depth: f64, elapsed_seconds: f64) {
        let equilibrium = Self::equilibrium(current_depth);
        for compartment in self.compartments.iter_mut() {
            compartment.advance(equilibrium, elapsed_seconds);
        }
    }

    fn snapshot(&self) -> alloc::vec::Vec<CompartmentLoading> {
        self.compartments.iter().map(CompartmentLoading::from).collect()
    }
}
