//! Total Response
//!
//! Combines the altitude term and the emission term:
//!
//! $$\Delta F(\mathbf{X}, z) = \Delta F_{alt}(z) + \Delta F_{em}(\mathbf{X}, z)$$
//!
//! Each call is a pure function of its inputs and the borrowed tables. The
//! result is a fresh [`ResponseBreakdown`] carrying both terms, the
//! per-species contributions and whether the altitude was inside the
//! tabulated range.

use crate::altitude::AltitudeResponse;
use crate::emissions::{EmissionResponse, EmissionTerm};
use ozrf_core::types::{AltitudeCoverage, DEFAULT_REFERENCE_ALTITUDE_KM};
use ozrf_core::{
    Emissions, FloatValue, Mode, Region, ResponseError, ResponseResult, TableSet,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the emission sensitivities are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensitivityMethod {
    /// Piecewise-linear over all tabulated altitudes, flat outside them.
    #[default]
    Tabulated,
    /// Straight line through the 16.2 km and 20.4 km rows of NO, SO and H2O.
    ClosedForm,
}

/// Result of a single response evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBreakdown {
    pub mode: Mode,
    pub region: Region,
    pub altitude_km: FloatValue,
    pub reference_altitude_km: FloatValue,
    /// Altitude term plus emission term.
    pub total: FloatValue,
    pub altitude_term: FloatValue,
    pub emission_term: FloatValue,
    /// Emission term per species, keyed as supplied.
    pub contributions: BTreeMap<String, FloatValue>,
    pub coverage: AltitudeCoverage,
}

impl ResponseBreakdown {
    fn new(
        mode: Mode,
        region: Region,
        altitude_km: FloatValue,
        reference_altitude_km: FloatValue,
        altitude_term: FloatValue,
        emission_term: EmissionTerm,
    ) -> Self {
        Self {
            mode,
            region,
            altitude_km,
            reference_altitude_km,
            total: altitude_term + emission_term.value,
            altitude_term,
            emission_term: emission_term.value,
            contributions: emission_term.contributions,
            coverage: emission_term.coverage,
        }
    }

    /// Unit of the response values.
    pub fn unit(&self) -> &'static str {
        self.mode.unit()
    }

    pub fn is_in_range(&self) -> bool {
        self.coverage.is_within()
    }
}

/// Evaluates the total response for the tables of one mode.
#[derive(Debug, Clone, Copy)]
pub struct ResponseAggregator<'a> {
    tables: &'a TableSet,
}

impl<'a> ResponseAggregator<'a> {
    pub fn new(tables: &'a TableSet) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'a TableSet {
        self.tables
    }

    fn validate(&self, mode: Mode, region: Region) -> ResponseResult<()> {
        self.tables.ensure_mode(mode)?;
        if region.is_derived() && !self.tables.is_prepared() {
            return Err(ResponseError::DerivedColumnUnavailable(region));
        }
        Ok(())
    }

    /// Altitude term only.
    pub fn altitude_term(
        &self,
        altitude_km: FloatValue,
        region: Region,
        reference_altitude_km: FloatValue,
        mode: Mode,
    ) -> ResponseResult<FloatValue> {
        self.validate(mode, region)?;
        AltitudeResponse::new(self.tables).calculate(altitude_km, region, reference_altitude_km)
    }

    /// Emission term only.
    pub fn emission_term(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
        mode: Mode,
    ) -> ResponseResult<EmissionTerm> {
        self.validate(mode, region)?;
        EmissionResponse::new(self.tables).calculate(altitude_km, emissions, region)
    }

    /// Total response at `altitude_km` relative to `reference_altitude_km`.
    pub fn total_response(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
        reference_altitude_km: FloatValue,
        mode: Mode,
    ) -> ResponseResult<ResponseBreakdown> {
        self.validate(mode, region)?;

        let altitude_term = AltitudeResponse::new(self.tables).calculate(
            altitude_km,
            region,
            reference_altitude_km,
        )?;
        let emission_term =
            EmissionResponse::new(self.tables).calculate(altitude_km, emissions, region)?;

        Ok(ResponseBreakdown::new(
            mode,
            region,
            altitude_km,
            reference_altitude_km,
            altitude_term,
            emission_term,
        ))
    }

    /// Total response at the default reference altitude of 18.3 km.
    pub fn total_response_default_reference(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
        mode: Mode,
    ) -> ResponseResult<ResponseBreakdown> {
        self.total_response(
            altitude_km,
            emissions,
            region,
            DEFAULT_REFERENCE_ALTITUDE_KM,
            mode,
        )
    }

    /// Response to moving from `reference_altitude_km` by `altitude_change_km`
    /// while changing emissions by `emission_changes`.
    pub fn single_response(
        &self,
        reference_altitude_km: FloatValue,
        altitude_change_km: FloatValue,
        emission_changes: &Emissions,
        region: Region,
        mode: Mode,
        method: SensitivityMethod,
    ) -> ResponseResult<ResponseBreakdown> {
        let altitude_km = reference_altitude_km + altitude_change_km;
        match method {
            SensitivityMethod::Tabulated => self.total_response(
                altitude_km,
                emission_changes,
                region,
                reference_altitude_km,
                mode,
            ),
            SensitivityMethod::ClosedForm => {
                self.validate(mode, region)?;
                let altitude_term = AltitudeResponse::new(self.tables).calculate(
                    altitude_km,
                    region,
                    reference_altitude_km,
                )?;
                let emission_term = EmissionResponse::new(self.tables).calculate_closed_form(
                    reference_altitude_km,
                    altitude_change_km,
                    emission_changes,
                    region,
                )?;
                Ok(ResponseBreakdown::new(
                    mode,
                    region,
                    altitude_km,
                    reference_altitude_km,
                    altitude_term,
                    emission_term,
                ))
            }
        }
    }
}
