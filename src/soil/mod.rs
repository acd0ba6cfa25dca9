mod soil_layer;
mod soil_profile;

pub use soil_layer::{LayerInput, SoilLayer, Transport};
pub use soil_profile::{ProfileInput, ProfileUpdate, SoilProfile};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a stored soil profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two bioturbation models a profile is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelKind {
    /// Discrete compartments exchanging with their neighbours.
    Model1,
    /// Continuum diffusion on a uniform grid.
    Model2,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Model1 => "model1",
            ModelKind::Model2 => "model2",
        }
    }
}

impl FromStr for ModelKind {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model1" => Ok(ModelKind::Model1),
            "model2" => Ok(ModelKind::Model2),
            _ => Err(UnknownModel(s.to_string())),
        }
    }
}

impl TryFrom<String> for ModelKind {
    type Error = UnknownModel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelKind> for String {
    fn from(model: ModelKind) -> Self {
        model.as_str().to_string()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model `{0}`, expected model1 or model2")]
pub struct UnknownModel(pub String);
