use crate::constants::DEFAULT_GRID_SCALE_H;
use crate::error::{BioturbationError, Result};
use crate::soil::{LayerInput, ModelKind, ProfileId, SoilLayer};
use serde::{Deserialize, Serialize};

/// A soil profile definition as submitted for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub model: ModelKind,
    pub layers: Vec<LayerInput>,
    /// Grid-cell thickness scale, read by Model 2 only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

/// A partial change to a stored profile. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub model: Option<ModelKind>,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub layers: Option<Vec<LayerInput>>,
}

/// Ordered top-to-bottom layers plus the model they were derived for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub id: ProfileId,
    pub model: ModelKind,
    pub h: f64,
    pub layers: Vec<SoilLayer>,
}

impl SoilProfile {
    /// Validate every layer and derive its transport parameter.
    ///
    /// Layer ids are assigned 1-based in input order. Nothing is built if any
    /// layer fails.
    pub fn from_input(id: ProfileId, input: &ProfileInput) -> Result<Self> {
        let h = input.h.unwrap_or(DEFAULT_GRID_SCALE_H);
        let layers = build_layers(&input.layers, input.model, h)?;
        Ok(Self {
            id,
            model: input.model,
            h,
            layers,
        })
    }

    /// Produce the updated profile, leaving `self` untouched on failure.
    ///
    /// Retained layers are re-derived whenever the model or `h` changes so the
    /// stored transport parameters always match the profile's settings.
    pub fn with_update(&self, update: &ProfileUpdate) -> Result<Self> {
        let model = update.model.unwrap_or(self.model);
        let h = update.h.unwrap_or(self.h);
        let layers = match &update.layers {
            Some(inputs) => build_layers(inputs, model, h)?,
            None => self
                .layers
                .iter()
                .map(|layer| layer.rederive(model, h))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(Self {
            id: self.id,
            model,
            h,
            layers,
        })
    }

    pub fn total_depth(&self) -> f64 {
        self.layers.iter().map(|l| l.depth).sum()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.layers.iter().map(|l| l.depth).collect()
    }

    pub fn initial_concentrations(&self) -> Vec<f64> {
        self.layers.iter().map(|l| l.initial_conc).collect()
    }

    pub fn transport_values(&self) -> Vec<f64> {
        self.layers.iter().map(|l| l.transport.value()).collect()
    }
}

fn build_layers(inputs: &[LayerInput], model: ModelKind, h: f64) -> Result<Vec<SoilLayer>> {
    if inputs.is_empty() {
        return Err(BioturbationError::EmptyProfile);
    }
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| SoilLayer::from_input(i + 1, input, model, h))
        .collect()
}
