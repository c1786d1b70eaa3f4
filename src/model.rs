//! Response model owning the tables of both modes.

use crate::config::{RunConfig, Scenario, TargetAltitude};
use log::{debug, info};
use ozrf_components::{EmissionTerm, ResponseAggregator, ResponseBreakdown, SensitivityMethod};
use ozrf_core::{
    DirectoryTables, EmbeddedTables, Emissions, FloatValue, Mode, Region, ResponseResult,
    TableProvider, TableSet,
};
use serde::{Deserialize, Serialize};

/// Prepared tables for every mode, loaded once and shared by reference.
///
/// All evaluation methods take `&self`; the model can be shared between
/// threads without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseModel {
    ozone: TableSet,
    radiative_forcing: TableSet,
}

impl ResponseModel {
    /// Load prepared tables for both modes from `provider`.
    pub fn load<P: TableProvider + ?Sized>(provider: &P) -> ResponseResult<Self> {
        Ok(Self {
            ozone: provider.load(Mode::Ozone, true)?,
            radiative_forcing: provider.load(Mode::RadiativeForcing, true)?,
        })
    }

    /// Model over the tables shipped with the crate.
    pub fn embedded() -> ResponseResult<Self> {
        Self::load(&EmbeddedTables)
    }

    /// Model over the tables selected by a run configuration.
    pub fn from_config(config: &RunConfig) -> ResponseResult<Self> {
        match &config.data_dir {
            Some(dir) => {
                debug!("Using tables from {}", dir.display());
                Self::load(&DirectoryTables::new(dir))
            }
            None => Self::embedded(),
        }
    }

    pub fn tables(&self, mode: Mode) -> &TableSet {
        match mode {
            Mode::Ozone => &self.ozone,
            Mode::RadiativeForcing => &self.radiative_forcing,
        }
    }

    fn aggregator(&self, mode: Mode) -> ResponseAggregator<'_> {
        ResponseAggregator::new(self.tables(mode))
    }

    pub fn altitude_term(
        &self,
        altitude_km: FloatValue,
        region: Region,
        reference_altitude_km: FloatValue,
        mode: Mode,
    ) -> ResponseResult<FloatValue> {
        self.aggregator(mode)
            .altitude_term(altitude_km, region, reference_altitude_km, mode)
    }

    pub fn emission_term(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
        mode: Mode,
    ) -> ResponseResult<EmissionTerm> {
        self.aggregator(mode)
            .emission_term(altitude_km, emissions, region, mode)
    }

    pub fn total_response(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
        reference_altitude_km: FloatValue,
        mode: Mode,
    ) -> ResponseResult<ResponseBreakdown> {
        self.aggregator(mode)
            .total_response(altitude_km, emissions, region, reference_altitude_km, mode)
    }

    /// [`total_response`](Self::total_response) with mode and region given by name.
    ///
    /// The mode is checked before the region, so a bad mode is always reported
    /// as a configuration error.
    pub fn total_response_named(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: &str,
        reference_altitude_km: FloatValue,
        mode: &str,
    ) -> ResponseResult<ResponseBreakdown> {
        let mode: Mode = mode.parse()?;
        let region: Region = region.parse()?;
        self.total_response(altitude_km, emissions, region, reference_altitude_km, mode)
    }

    pub fn single_response(
        &self,
        reference_altitude_km: FloatValue,
        altitude_change_km: FloatValue,
        emission_changes: &Emissions,
        region: Region,
        mode: Mode,
        method: SensitivityMethod,
    ) -> ResponseResult<ResponseBreakdown> {
        self.aggregator(mode).single_response(
            reference_altitude_km,
            altitude_change_km,
            emission_changes,
            region,
            mode,
            method,
        )
    }

    /// Evaluate at the `Min_val`, `Mean` and `Max_val` columns.
    pub fn envelope(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        reference_altitude_km: FloatValue,
        mode: Mode,
    ) -> ResponseResult<ResponseEnvelope> {
        let evaluate = |region| {
            self.total_response(altitude_km, emissions, region, reference_altitude_km, mode)
        };
        Ok(ResponseEnvelope {
            min_val: evaluate(Region::MinVal)?,
            mean: evaluate(Region::Mean)?,
            max_val: evaluate(Region::MaxVal)?,
        })
    }

    pub fn evaluate(&self, scenario: &Scenario) -> ResponseResult<ResponseBreakdown> {
        match scenario.target()? {
            TargetAltitude::Absolute(altitude_km) => self.total_response(
                altitude_km,
                &scenario.emissions,
                scenario.region,
                scenario.reference_altitude_km,
                scenario.mode,
            ),
            TargetAltitude::Change(altitude_change_km) => self.single_response(
                scenario.reference_altitude_km,
                altitude_change_km,
                &scenario.emissions,
                scenario.region,
                scenario.mode,
                scenario.method,
            ),
        }
    }

    /// Evaluate every scenario of a run, stopping at the first failure.
    pub fn run(&self, config: &RunConfig) -> ResponseResult<Vec<ScenarioOutcome>> {
        config
            .scenarios
            .iter()
            .map(|scenario| {
                let breakdown = self.evaluate(scenario)?;
                info!(
                    "{}: total={:.4} {} (altitude={:.4}, emissions={:.4})",
                    scenario.name,
                    breakdown.total,
                    breakdown.unit(),
                    breakdown.altitude_term,
                    breakdown.emission_term
                );
                Ok(ScenarioOutcome {
                    name: scenario.name.clone(),
                    breakdown,
                })
            })
            .collect()
    }
}

/// Responses evaluated at the derived `Min_val`, `Mean` and `Max_val` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub min_val: ResponseBreakdown,
    pub mean: ResponseBreakdown,
    pub max_val: ResponseBreakdown,
}

impl ResponseEnvelope {
    /// Smallest and largest total of the three evaluations.
    ///
    /// The `Min_val` column does not always give the smallest total, since a
    /// coefficient enters with the sign of the altitude offset.
    pub fn bounds(&self) -> (FloatValue, FloatValue) {
        [&self.min_val, &self.mean, &self.max_val]
            .iter()
            .map(|b| b.total)
            .fold((FloatValue::INFINITY, FloatValue::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t), hi.max(t))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub breakdown: ResponseBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ozrf_core::ResponseError;

    #[test]
    fn test_named_entry_point() {
        let model = ResponseModel::embedded().unwrap();
        let emissions = Emissions::new().with("NO", 43.2);

        let breakdown = model
            .total_response_named(16.2, &emissions, "Transatlantic_Corridor", 18.3, "Ozone")
            .unwrap();
        assert_relative_eq!(breakdown.altitude_term, 0.175, epsilon = 1e-3);

        let err = model
            .total_response_named(16.2, &emissions, "Nowhere", 18.3, "Ozone")
            .unwrap_err();
        assert!(err.is_lookup());

        let err = model
            .total_response_named(16.2, &emissions, "Nowhere", 18.3, "ozone")
            .unwrap_err();
        assert!(matches!(err, ResponseError::Configuration(_)));
    }

    #[test]
    fn test_mode_dispatch() {
        let model = ResponseModel::embedded().unwrap();
        let rf = model
            .altitude_term(16.2, Region::TransatlanticCorridor, 18.3, Mode::RadiativeForcing)
            .unwrap();
        assert_relative_eq!(rf, -1.2415, epsilon = 1e-3);
        assert_eq!(model.tables(Mode::RadiativeForcing).mode(), Mode::RadiativeForcing);
    }

    #[test]
    fn test_envelope_mean_between_columns() {
        let model = ResponseModel::embedded().unwrap();
        let emissions = Emissions::new().with("SO", 2.8224).with("H2O", 3.36);

        let envelope = model.envelope(19.0, &emissions, 18.3, Mode::Ozone).unwrap();
        let (lo, hi) = envelope.bounds();

        assert!(lo <= envelope.mean.total && envelope.mean.total <= hi);
        assert_relative_eq!(
            envelope.mean.emission_term,
            (envelope.min_val.emission_term + envelope.max_val.emission_term) / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_evaluate_change_scenario() {
        let model = ResponseModel::embedded().unwrap();
        let config = RunConfig::from_toml_str(
            r#"
            [[scenario]]
            name = "sas-climb"
            altitude_change_km = 4.2
            reference_altitude_km = 16.2
            region = "South_Arabian_Sea"

            [scenario.emissions]
            NO = 43.2
            "#,
        )
        .unwrap();

        let breakdown = model.evaluate(&config.scenarios[0]).unwrap();
        assert_relative_eq!(breakdown.altitude_km, 20.4, epsilon = 1e-12);
        assert_relative_eq!(breakdown.altitude_term, -1.003, epsilon = 1e-3);
        assert_relative_eq!(breakdown.emission_term, -0.1854, epsilon = 1e-3);
    }
}
