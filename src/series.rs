//! Concentration-versus-time series produced by a finished run.
//!
//! The record shape is what the result store holds and what the presentation
//! side reads: one shared list of time indices plus one concentration list
//! per layer, all of the same length.

use crate::sim::LayerHistory;
use crate::soil::{ModelKind, ProfileId, SoilProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Identifier of a stored simulation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(pub u64);

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSeries {
    /// 1-based layer id in profile order.
    pub id: usize,
    /// Non-finite samples are written as `"NaN"`, `"inf"` or `"-inf"`.
    #[serde(with = "samples")]
    pub conc: Vec<f64>,
}

/// JSON has no NaN or infinity, and a diverged Model 2 run or an unpainted
/// layer produces both. Finite values stay plain numbers.
mod samples {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    struct Sample(f64);

    impl Serialize for Sample {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let value = self.0;
            if value.is_finite() {
                serializer.serialize_f64(value)
            } else if value.is_nan() {
                serializer.serialize_str("NaN")
            } else if value > 0.0 {
                serializer.serialize_str("inf")
            } else {
                serializer.serialize_str("-inf")
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Number(f64),
        Text(String),
        // older exports wrote non-finite values as null
        Null(()),
    }

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| Sample(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Encoded>::deserialize(deserializer)?
            .into_iter()
            .map(|sample| match sample {
                Encoded::Number(value) => Ok(value),
                Encoded::Null(()) => Ok(f64::NAN),
                Encoded::Text(text) => match text.as_str() {
                    "NaN" => Ok(f64::NAN),
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    other => Err(D::Error::custom(format!("invalid sample `{other}`"))),
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationSeries {
    pub simulation_id: SimulationId,
    pub model: ModelKind,
    pub profile_id: ProfileId,
    pub time_steps: Vec<usize>,
    pub layers: Vec<LayerSeries>,
}

impl ConcentrationSeries {
    /// Tag each recorded layer with its profile layer id and align it to `0..len`.
    pub fn assemble(
        simulation_id: SimulationId,
        profile: &SoilProfile,
        history: LayerHistory,
    ) -> Self {
        let time_steps = (0..history.len()).collect();
        let layers = profile
            .layers
            .iter()
            .zip(history.into_layers())
            .map(|(layer, conc)| LayerSeries { id: layer.id, conc })
            .collect();
        Self {
            simulation_id,
            model: profile.model,
            profile_id: profile.id,
            time_steps,
            layers,
        }
    }

    pub fn len(&self) -> usize {
        self.time_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_steps.is_empty()
    }

    /// Last sample of every layer.
    pub fn final_concentrations(&self) -> Vec<f64> {
        self.layers
            .iter()
            .filter_map(|layer| layer.conc.last().copied())
            .collect()
    }

    /// Write a wide table: `time,soil_layer_1,...` then one row per time index.
    ///
    /// Fails with `InvalidData` when a layer's samples do not line up with
    /// `time_steps`.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        if let Some(layer) = self
            .layers
            .iter()
            .find(|layer| layer.conc.len() != self.time_steps.len())
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "layer {} has {} samples for {} time steps",
                    layer.id,
                    layer.conc.len(),
                    self.time_steps.len()
                ),
            ));
        }

        write!(out, "time")?;
        for layer in &self.layers {
            write!(out, ",soil_layer_{}", layer.id)?;
        }
        writeln!(out)?;

        for (row, time) in self.time_steps.iter().enumerate() {
            write!(out, "{time}")?;
            for layer in &self.layers {
                write!(out, ",{}", layer.conc[row])?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }

    pub fn write_json_file<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    /// File name used when handing this series to the presentation side.
    pub fn file_stem(&self) -> String {
        format!("bioturbation_series_{}", self.simulation_id)
    }
}
