//! Run configuration
//!
//! A run is described by a TOML document listing scenarios:
//!
//! ```toml
//! data_dir = "data"
//!
//! [[scenario]]
//! name = "tac-descent"
//! altitude_km = 16.2
//! reference_altitude_km = 18.3
//! region = "Transatlantic_Corridor"
//! mode = "Ozone"
//!
//! [scenario.emissions]
//! NO = 43.2
//! ```
//!
//! `data_dir` is optional; without it the tables shipped with `ozrf-core` are
//! used. A relative `data_dir` is resolved against the directory of the
//! configuration file.

use ozrf_components::SensitivityMethod;
use ozrf_core::types::DEFAULT_REFERENCE_ALTITUDE_KM;
use ozrf_core::{Emissions, FloatValue, Mode, Region, ResponseError, ResponseResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_reference_altitude() -> FloatValue {
    DEFAULT_REFERENCE_ALTITUDE_KM
}

/// A single evaluation request.
///
/// Exactly one of `altitude_km` and `altitude_change_km` must be given. The
/// change form is measured from `reference_altitude_km`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_km: Option<FloatValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_change_km: Option<FloatValue>,
    pub reference_altitude_km: FloatValue,
    pub region: Region,
    pub mode: Mode,
    pub emissions: Emissions,
    /// Only used with `altitude_change_km`.
    pub method: SensitivityMethod,
}

/// A scenario as written in the TOML document.
///
/// Mode and region stay strings here so that unknown names are reported by
/// their own parsers rather than as TOML syntax errors.
#[derive(Debug, Deserialize)]
struct ScenarioRecord {
    name: String,
    #[serde(default)]
    altitude_km: Option<FloatValue>,
    #[serde(default)]
    altitude_change_km: Option<FloatValue>,
    #[serde(default = "default_reference_altitude")]
    reference_altitude_km: FloatValue,
    region: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    emissions: Emissions,
    #[serde(default)]
    method: SensitivityMethod,
}

impl TryFrom<ScenarioRecord> for Scenario {
    type Error = ResponseError;

    fn try_from(record: ScenarioRecord) -> ResponseResult<Self> {
        let mode = match record.mode.as_deref() {
            Some(mode) => mode.parse()?,
            None => Mode::default(),
        };
        Ok(Scenario {
            name: record.name,
            altitude_km: record.altitude_km,
            altitude_change_km: record.altitude_change_km,
            reference_altitude_km: record.reference_altitude_km,
            region: record.region.parse()?,
            mode,
            emissions: record.emissions,
            method: record.method,
        })
    }
}

/// Where a scenario's emission altitude comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetAltitude {
    Absolute(FloatValue),
    Change(FloatValue),
}

impl Scenario {
    pub fn target(&self) -> ResponseResult<TargetAltitude> {
        match (self.altitude_km, self.altitude_change_km) {
            (Some(altitude), None) => Ok(TargetAltitude::Absolute(altitude)),
            (None, Some(change)) => Ok(TargetAltitude::Change(change)),
            (Some(_), Some(_)) => Err(ResponseError::Configuration(format!(
                "scenario '{}' sets both altitude_km and altitude_change_km",
                self.name
            ))),
            (None, None) => Err(ResponseError::Configuration(format!(
                "scenario '{}' needs altitude_km or altitude_change_km",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(rename = "scenario")]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
struct RunRecord {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    scenario: Vec<ScenarioRecord>,
}

impl RunConfig {
    /// Parse and validate a run configuration.
    ///
    /// An unknown mode is a [`ResponseError::Configuration`] and an unknown
    /// region a [`ResponseError::UnknownRegion`].
    pub fn from_toml_str(source: &str) -> ResponseResult<Self> {
        let record: RunRecord = toml::from_str(source)?;
        let config = RunConfig {
            data_dir: record.data_dir,
            scenarios: record
                .scenario
                .into_iter()
                .map(Scenario::try_from)
                .collect::<ResponseResult<_>>()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file, resolving `data_dir` against its directory.
    pub fn from_file(path: &Path) -> ResponseResult<Self> {
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(data_dir) = config.data_dir.as_mut() {
            if data_dir.is_relative() {
                *data_dir = parent.join(&*data_dir);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> ResponseResult<()> {
        for scenario in &self.scenarios {
            scenario.target()?;
        }
        let mut names: Vec<&str> = self.scenarios.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(ResponseError::Configuration(format!(
                "duplicate scenario name '{}'",
                pair[0]
            )));
        }
        Ok(())
    }
}
