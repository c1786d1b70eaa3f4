//! Keys and value types shared by the tables and the evaluators.

use crate::errors::{ResponseError, ResponseResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Floating point type used throughout the response functions.
pub type FloatValue = f64;

/// Altitude (km) around which the Taylor expansion was fitted.
pub const TAYLOR_BASELINE_ALTITUDE_KM: FloatValue = 18.3;

/// Reference altitude (km) used when the caller does not supply one.
pub const DEFAULT_REFERENCE_ALTITUDE_KM: FloatValue = 18.3;

/// Which response is evaluated.
///
/// The mode selects the coefficient tables and the unit of the result:
/// Dobson Units for [`Mode::Ozone`] and mW/m² for [`Mode::RadiativeForcing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Change in ozone column.
    #[default]
    Ozone,
    /// Change in radiative forcing.
    #[serde(rename = "Radiative_Forcing")]
    RadiativeForcing,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Ozone, Mode::RadiativeForcing];

    /// Label used in table file names and Taylor parameter names.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Ozone => "Ozone",
            Mode::RadiativeForcing => "Radiative_Forcing",
        }
    }

    /// Unit of an evaluated response.
    pub fn unit(&self) -> &'static str {
        match self {
            Mode::Ozone => "DU",
            Mode::RadiativeForcing => "mW/m^2",
        }
    }

    /// Convert a raw sensitivity product to the unit of the response.
    ///
    /// Ozone sensitivities are tabulated in mDU and are divided by 1000.
    /// Radiative forcing sensitivities are already in mW/m².
    pub fn scale_emission_response(&self, value: FloatValue) -> FloatValue {
        match self {
            Mode::Ozone => value / 1000.0,
            Mode::RadiativeForcing => value,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Mode {
    type Err = ResponseError;

    fn from_str(s: &str) -> ResponseResult<Self> {
        match s {
            "Ozone" => Ok(Mode::Ozone),
            "Radiative_Forcing" => Ok(Mode::RadiativeForcing),
            other => Err(ResponseError::Configuration(format!(
                "mode should be either Ozone or Radiative_Forcing, got '{other}'"
            ))),
        }
    }
}

/// A column of the coefficient tables.
///
/// The two corridors are read directly from the source files. The remaining
/// variants are derived per row when the tables are prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Transatlantic_Corridor")]
    TransatlanticCorridor,
    #[serde(rename = "South_Arabian_Sea")]
    SouthArabianSea,
    Mean,
    Range,
    #[serde(rename = "Max_val")]
    MaxVal,
    #[serde(rename = "Min_val")]
    MinVal,
}

impl Region {
    /// The flight corridors present in every source table.
    pub const CORRIDORS: [Region; 2] = [Region::TransatlanticCorridor, Region::SouthArabianSea];

    pub fn column_name(&self) -> &'static str {
        match self {
            Region::TransatlanticCorridor => "Transatlantic_Corridor",
            Region::SouthArabianSea => "South_Arabian_Sea",
            Region::Mean => "Mean",
            Region::Range => "Range",
            Region::MaxVal => "Max_val",
            Region::MinVal => "Min_val",
        }
    }

    /// Whether the column only exists on prepared tables.
    pub fn is_derived(&self) -> bool {
        !matches!(
            self,
            Region::TransatlanticCorridor | Region::SouthArabianSea
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl FromStr for Region {
    type Err = ResponseError;

    fn from_str(s: &str) -> ResponseResult<Self> {
        match s {
            "Transatlantic_Corridor" => Ok(Region::TransatlanticCorridor),
            "South_Arabian_Sea" => Ok(Region::SouthArabianSea),
            "Mean" => Ok(Region::Mean),
            "Range" => Ok(Region::Range),
            "Max_val" => Ok(Region::MaxVal),
            "Min_val" => Ok(Region::MinVal),
            other => Err(ResponseError::UnknownRegion(other.to_string())),
        }
    }
}

/// Annual emission deltas keyed by species (e.g. `NO`, `SO`, `H2O`).
///
/// Magnitudes are in species-specific units: Gg NO₂/yr, Gg S/yr, Tg H₂O/yr.
/// Iteration is in key order so repeated evaluations sum in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emissions(BTreeMap<String, FloatValue>);

impl Emissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, species: impl Into<String>, magnitude: FloatValue) -> Self {
        self.insert(species, magnitude);
        self
    }

    pub fn insert(&mut self, species: impl Into<String>, magnitude: FloatValue) {
        self.0.insert(species.into(), magnitude);
    }

    pub fn get(&self, species: &str) -> Option<FloatValue> {
        self.0.get(species).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FloatValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FloatValue)> for Emissions {
    fn from_iter<I: IntoIterator<Item = (S, FloatValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Whether an evaluation altitude lies inside the tabulated altitude range.
///
/// Outside the range the emission sensitivities are held at the nearest edge
/// value, so the result is still valid but carries higher uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum AltitudeCoverage {
    Within,
    Outside {
        altitude_km: FloatValue,
        min_km: FloatValue,
        max_km: FloatValue,
    },
}

impl AltitudeCoverage {
    /// Classify `altitude_km` against the closed interval `[min_km, max_km]`.
    pub fn classify(altitude_km: FloatValue, min_km: FloatValue, max_km: FloatValue) -> Self {
        if (min_km..=max_km).contains(&altitude_km) {
            AltitudeCoverage::Within
        } else {
            AltitudeCoverage::Outside {
                altitude_km,
                min_km,
                max_km,
            }
        }
    }

    pub fn is_within(&self) -> bool {
        matches!(self, AltitudeCoverage::Within)
    }

    /// Combine two coverage results, keeping the first out-of-range report.
    pub fn and(self, other: AltitudeCoverage) -> AltitudeCoverage {
        match self {
            AltitudeCoverage::Within => other,
            outside => outside,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Ozone".parse::<Mode>().unwrap(), Mode::Ozone);
        assert_eq!(
            "Radiative_Forcing".parse::<Mode>().unwrap(),
            Mode::RadiativeForcing
        );

        let err = "Radiative Forcing".parse::<Mode>().unwrap_err();
        assert!(matches!(err, ResponseError::Configuration(_)));
    }

    #[test]
    fn test_mode_scaling() {
        assert_eq!(Mode::Ozone.scale_emission_response(2500.0), 2.5);
        assert_eq!(Mode::RadiativeForcing.scale_emission_response(2500.0), 2500.0);
    }

    #[test]
    fn test_region_parsing_roundtrip() {
        for region in [
            Region::TransatlanticCorridor,
            Region::SouthArabianSea,
            Region::Mean,
            Region::Range,
            Region::MaxVal,
            Region::MinVal,
        ] {
            assert_eq!(region.column_name().parse::<Region>().unwrap(), region);
        }

        let err = "North_Atlantic".parse::<Region>().unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn test_region_derived() {
        assert!(!Region::TransatlanticCorridor.is_derived());
        assert!(!Region::SouthArabianSea.is_derived());
        assert!(Region::Mean.is_derived());
        assert!(Region::MinVal.is_derived());
    }

    #[test]
    fn test_emissions_iterate_in_key_order() {
        let emissions = Emissions::new()
            .with("SO", 2.8224)
            .with("H2O", 3.36)
            .with("NO", 43.2);

        let species: Vec<_> = emissions.species().collect();
        assert_eq!(species, vec!["H2O", "NO", "SO"]);
        assert_eq!(emissions.get("NO"), Some(43.2));
        assert_eq!(emissions.len(), 3);
    }

    #[test]
    fn test_coverage_classification() {
        assert!(AltitudeCoverage::classify(16.2, 16.2, 20.4).is_within());
        assert!(AltitudeCoverage::classify(20.4, 16.2, 20.4).is_within());

        let outside = AltitudeCoverage::classify(50.0, 16.2, 20.4);
        assert!(!outside.is_within());
        assert!(!AltitudeCoverage::Within.and(outside).is_within());
        assert!(!outside.and(AltitudeCoverage::Within).is_within());
    }

    #[test]
    fn test_emissions_deserialize_from_map() {
        let emissions: Emissions = serde_json::from_str(r#"{"NO": 43.2, "H2O": 3.36}"#).unwrap();
        assert_eq!(emissions.get("H2O"), Some(3.36));
    }
}
