use crate::error::{BioturbationError, Result};
use crate::soil::ModelKind;
use serde::{Deserialize, Serialize};

/// Raw layer attributes as they arrive from a profile definition.
///
/// Every field is optional here so that a missing attribute is reported as a
/// validation failure naming the field, instead of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_conc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earthworm_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
}

impl LayerInput {
    pub fn new(depth: f64, initial_conc: f64, earthworm_density: f64, beta: f64) -> Self {
        Self {
            depth: Some(depth),
            initial_conc: Some(initial_conc),
            earthworm_density: Some(earthworm_density),
            beta: Some(beta),
        }
    }
}

/// Per-layer transport parameter; which one a layer carries depends on the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Model 1: `earthworm_density * beta / depth`
    BioturbationRate(f64),
    /// Model 2: `earthworm_density * beta * h`
    DiffusionCoefficient(f64),
}

impl Transport {
    pub fn value(&self) -> f64 {
        match self {
            Transport::BioturbationRate(v) | Transport::DiffusionCoefficient(v) => *v,
        }
    }
}

/// A validated soil stratum with its derived transport parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilLayer {
    /// 1-based position in the profile, top to bottom.
    pub id: usize,
    pub depth: f64,
    #[serde(rename = "conc")]
    pub initial_conc: f64,
    pub earthworm_density: f64,
    pub beta: f64,
    #[serde(flatten)]
    pub transport: Transport,
}

impl SoilLayer {
    /// Validate raw attributes and derive the transport parameter for `model`.
    ///
    /// `h` is only read by Model 2.
    pub fn from_input(id: usize, input: &LayerInput, model: ModelKind, h: f64) -> Result<Self> {
        let require = |value: Option<f64>, field: &'static str| {
            value.ok_or(BioturbationError::MissingField { layer: id, field })
        };
        let depth = require(input.depth, "depth")?;
        let initial_conc = require(input.initial_conc, "initial_conc")?;
        let earthworm_density = require(input.earthworm_density, "earthworm_density")?;
        let beta = require(input.beta, "beta")?;
        if !depth.is_finite() || depth < 0.0 {
            return Err(BioturbationError::InvalidDepth { layer: id, depth });
        }

        let transport = derive_transport(model, id, depth, earthworm_density, beta, h)?;
        Ok(Self {
            id,
            depth,
            initial_conc,
            earthworm_density,
            beta,
            transport,
        })
    }

    /// Re-derive the transport parameter from the stored raw attributes.
    pub fn rederive(&self, model: ModelKind, h: f64) -> Result<Self> {
        let transport =
            derive_transport(model, self.id, self.depth, self.earthworm_density, self.beta, h)?;
        Ok(Self {
            transport,
            ..self.clone()
        })
    }
}

fn derive_transport(
    model: ModelKind,
    layer: usize,
    depth: f64,
    earthworm_density: f64,
    beta: f64,
    h: f64,
) -> Result<Transport> {
    match model {
        ModelKind::Model1 => {
            if depth == 0.0 {
                return Err(BioturbationError::ZeroDepth { layer });
            }
            Ok(Transport::BioturbationRate(earthworm_density * beta / depth))
        }
        ModelKind::Model2 => Ok(Transport::DiffusionCoefficient(earthworm_density * beta * h)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn model1_rate_divides_by_depth() {
        let layer =
            SoilLayer::from_input(1, &LayerInput::new(20.0, 5.0, 100.0, 2e-7), ModelKind::Model1, 0.2)
                .unwrap();
        assert_relative_eq!(layer.transport.value(), 100.0 * 2e-7 / 20.0);
        assert!(matches!(layer.transport, Transport::BioturbationRate(_)));
    }

    #[test]
    fn model2_coefficient_scales_by_h() {
        let layer =
            SoilLayer::from_input(1, &LayerInput::new(20.0, 5.0, 100.0, 2e-7), ModelKind::Model2, 0.5)
                .unwrap();
        assert_relative_eq!(layer.transport.value(), 100.0 * 2e-7 * 0.5);
        assert!(matches!(layer.transport, Transport::DiffusionCoefficient(_)));
    }

    #[test]
    fn zero_depth_fails_for_model1_only() {
        let input = LayerInput::new(0.0, 1.0, 10.0, 0.1);
        let err = SoilLayer::from_input(2, &input, ModelKind::Model1, 0.2).unwrap_err();
        assert!(matches!(err, BioturbationError::ZeroDepth { layer: 2 }));

        assert!(SoilLayer::from_input(2, &input, ModelKind::Model2, 0.2).is_ok());
    }

    #[test]
    fn negative_or_non_finite_depth_is_rejected() {
        for depth in [-1.0, f64::NAN, f64::INFINITY] {
            for model in [ModelKind::Model1, ModelKind::Model2] {
                let err = SoilLayer::from_input(3, &LayerInput::new(depth, 1.0, 1.0, 1.0), model, 0.2)
                    .unwrap_err();
                assert!(matches!(err, BioturbationError::InvalidDepth { layer: 3, .. }));
            }
        }
    }

    #[test]
    fn missing_field_is_named() {
        let input = LayerInput {
            beta: None,
            ..LayerInput::new(1.0, 1.0, 1.0, 1.0)
        };
        let err = SoilLayer::from_input(4, &input, ModelKind::Model1, 0.2).unwrap_err();
        assert!(matches!(
            err,
            BioturbationError::MissingField { layer: 4, field: "beta" }
        ));
    }

    #[test]
    fn serializes_with_derived_field_name() {
        let layer =
            SoilLayer::from_input(1, &LayerInput::new(10.0, 3.0, 1.0, 1.0), ModelKind::Model1, 0.2)
                .unwrap();
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["conc"], 3.0);
        assert_eq!(json["bioturbation_rate"], 0.1);

        let back: SoilLayer = serde_json::from_value(json).unwrap();
        assert_eq!(back, layer);
    }
}
