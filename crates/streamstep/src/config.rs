use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Generator family a run draws from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    #[value(name = "mrg31k3p")]
    Mrg31k3p,
    #[value(name = "mrg32k3a")]
    Mrg32k3a,
    #[value(name = "philox432")]
    Philox432,
    #[value(name = "lfsr113")]
    Lfsr113,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeneratorKind::Mrg31k3p => "mrg31k3p",
            GeneratorKind::Mrg32k3a => "mrg32k3a",
            GeneratorKind::Philox432 => "philox432",
            GeneratorKind::Lfsr113 => "lfsr113",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// Streams are minted `2^e + c` steps apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    pub e: i32,
    pub c: i32,
}

/// Normal draws with mean `mu` and deviation `sigma` instead of uniforms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normal {
    pub mu: f64,
    pub sigma: f64,
}

/// Parsed run document describing which streams to mint and how to draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub generator: GeneratorKind,
    pub streams: usize,
    /// Draws per stream.
    pub draws: usize,
    pub spacing: Option<Spacing>,
    /// Explicit creator seed in the generator's state layout.
    pub base_state: Option<serde_json::Value>,
    /// Label hashed into a creator seed.
    pub seed_label: Option<String>,
    pub substream_length: i64,
    pub streams_per_lane: usize,
    pub precision: Precision,
    pub normal: Option<Normal>,
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorKind::default(),
            streams: 10,
            draws: 10,
            spacing: None,
            base_state: None,
            seed_label: None,
            substream_length: 0,
            streams_per_lane: 1,
            precision: Precision::default(),
            normal: None,
            parallel: false,
        }
    }
}

impl RunConfig {
    /// Load a run document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open run config {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a run document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader).context("invalid run config json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.streams > 0, "streams must be positive");
        ensure!(
            self.streams_per_lane > 0 && self.streams % self.streams_per_lane == 0,
            "streams ({}) must be a multiple of streams_per_lane ({})",
            self.streams,
            self.streams_per_lane
        );
        ensure!(
            self.base_state.is_none() || self.seed_label.is_none(),
            "base_state and seed_label are mutually exclusive"
        );
        if let Some(Normal { sigma, .. }) = self.normal {
            ensure!(
                sigma.is_finite() && sigma > 0.0,
                "normal.sigma must be positive, got {sigma}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RunConfig::from_reader(r#"{"generator": "philox432"}"#.as_bytes()).unwrap();
        assert_eq!(config.generator, GeneratorKind::Philox432);
        assert_eq!(config.streams, 10);
        assert_eq!(config.precision, Precision::Double);
        assert_eq!(config.spacing, None);
    }

    #[test]
    fn full_document_parses() {
        let json = r#"{
            "generator": "mrg32k3a",
            "streams": 8,
            "draws": 100,
            "spacing": {"e": 40, "c": 0},
            "seed_label": "batch-7",
            "substream_length": 25,
            "streams_per_lane": 4,
            "precision": "single",
            "parallel": true
        }"#;
        let config = RunConfig::from_reader(json.as_bytes()).unwrap();
        assert_eq!(config.spacing, Some(Spacing { e: 40, c: 0 }));
        assert_eq!(config.seed_label.as_deref(), Some("batch-7"));
        assert_eq!(config.precision, Precision::Single);
        assert!(config.parallel);
    }

    #[test]
    fn lfsr113_is_selectable() {
        let config = RunConfig::from_reader(r#"{"generator": "lfsr113"}"#.as_bytes()).unwrap();
        assert_eq!(config.generator, GeneratorKind::Lfsr113);
        assert_eq!(config.generator.to_string(), "lfsr113");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(RunConfig::from_reader(r#"{"stream": 3}"#.as_bytes()).is_err());
    }

    #[test]
    fn seed_sources_are_exclusive() {
        let json = r#"{"base_state": {"g1": [1,2,3], "g2": [4,5,6]}, "seed_label": "x"}"#;
        let err = RunConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn normal_draws_need_a_positive_sigma() {
        let config =
            RunConfig::from_reader(r#"{"normal": {"mu": 1.5, "sigma": 0.25}}"#.as_bytes()).unwrap();
        assert_eq!(config.normal, Some(Normal { mu: 1.5, sigma: 0.25 }));
        let err = RunConfig::from_reader(r#"{"normal": {"mu": 0, "sigma": -1}}"#.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("sigma"));
    }

    #[test]
    fn lanes_must_divide_streams() {
        let err = RunConfig::from_reader(r#"{"streams": 6, "streams_per_lane": 4}"#.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("streams_per_lane"));
    }
}
