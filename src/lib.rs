pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod math_utils;
pub mod orchestrator;
pub mod series;
pub mod sim;
pub mod soil;
pub mod store;

pub use engine::{SimulationOutcome, SimulationRequest};
pub use error::{BioturbationError, ErrorKind, Result};
pub use series::{ConcentrationSeries, SimulationId};
pub use soil::{ModelKind, ProfileId, ProfileInput, ProfileUpdate, SoilProfile};
