//! Emission Response
//!
//! The emission part of the response sums, over the requested species, the
//! emission magnitude times the species sensitivity at the emission altitude:
//!
//! $$\Delta F_{em}(z) = \sum_i x_i \, s_i(z)$$
//!
//! $s_i(z)$ is interpolated linearly between the tabulated altitudes and held
//! at the edge value outside them. Ozone sensitivities are tabulated in mDU so
//! the ozone result is divided by 1000 to give DU.
//!
//! A closed-form variant for the three tabulated species (NO, SO, H2O) draws a
//! straight line through the 16.2 km and 20.4 km rows instead. It agrees with
//! the general interpolation at those two altitudes and extrapolates linearly
//! beyond them.

use log::warn;
use ozrf_core::types::AltitudeCoverage;
use ozrf_core::{Emissions, FloatValue, Region, ResponseError, ResponseResult, TableSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lower altitude (km) of the closed-form interpolation.
pub const CLOSED_FORM_BASE_ALTITUDE_KM: FloatValue = 16.2;
/// Altitude span (km) between the two rows of the closed-form interpolation.
pub const CLOSED_FORM_SPAN_KM: FloatValue = 4.2;
/// Species the closed-form interpolation is tabulated for.
pub const CLOSED_FORM_SPECIES: [&str; 3] = ["NO", "SO", "H2O"];

/// Emission term with the contribution of each species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionTerm {
    /// Sum of all species contributions (DU or mW/m²).
    pub value: FloatValue,
    /// Contribution per species, keyed as supplied by the caller.
    pub contributions: BTreeMap<String, FloatValue>,
    pub coverage: AltitudeCoverage,
}

impl EmissionTerm {
    fn from_contributions(
        contributions: BTreeMap<String, FloatValue>,
        coverage: AltitudeCoverage,
    ) -> Self {
        Self {
            value: contributions.values().sum(),
            contributions,
            coverage,
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.coverage.is_within()
    }
}

/// Emission term of the response for the mode of a [`TableSet`].
#[derive(Debug, Clone, Copy)]
pub struct EmissionResponse<'a> {
    tables: &'a TableSet,
}

impl<'a> EmissionResponse<'a> {
    pub fn new(tables: &'a TableSet) -> Self {
        Self { tables }
    }

    /// Classify the altitude against the sensitivity table.
    pub fn coverage(&self, altitude_km: FloatValue) -> AltitudeCoverage {
        let (min_km, max_km) = self.tables.altitude_range();
        AltitudeCoverage::classify(altitude_km, min_km, max_km)
    }

    /// Build the term once every species has resolved, warning when the
    /// altitude is outside the tabulated range.
    fn finish(
        &self,
        altitude_km: FloatValue,
        contributions: BTreeMap<String, FloatValue>,
    ) -> EmissionTerm {
        let coverage = self.coverage(altitude_km);
        if let AltitudeCoverage::Outside { min_km, max_km, .. } = coverage {
            warn!(
                "Altitude {altitude_km} km is outside the supported range {min_km}-{max_km} km. \
                 The estimate will have higher uncertainty"
            );
        }
        EmissionTerm::from_contributions(contributions, coverage)
    }

    /// Sensitivity of one species at `altitude_km`, in table units per unit emission.
    pub fn sensitivity(
        &self,
        species: &str,
        altitude_km: FloatValue,
        region: Region,
    ) -> ResponseResult<FloatValue> {
        let profile = self.tables.sensitivity().profile(species, region)?;
        Ok(profile.interpolate(altitude_km))
    }

    /// Emission term at `altitude_km` using the tabulated altitude profiles.
    ///
    /// Any unknown species fails the whole call.
    pub fn calculate(
        &self,
        altitude_km: FloatValue,
        emissions: &Emissions,
        region: Region,
    ) -> ResponseResult<EmissionTerm> {
        let mode = self.tables.mode();

        let contributions = emissions
            .iter()
            .map(|(species, magnitude)| {
                let sensitivity = self.sensitivity(species, altitude_km, region)?;
                Ok((
                    species.to_string(),
                    mode.scale_emission_response(magnitude * sensitivity),
                ))
            })
            .collect::<ResponseResult<BTreeMap<_, _>>>()?;

        Ok(self.finish(altitude_km, contributions))
    }

    /// Sensitivity of one species from the straight line through the 16.2 km
    /// and 20.4 km rows.
    ///
    /// `altitude_change_km` is measured from `reference_altitude_km`.
    pub fn closed_form_sensitivity(
        &self,
        species: &str,
        reference_altitude_km: FloatValue,
        altitude_change_km: FloatValue,
        region: Region,
    ) -> ResponseResult<FloatValue> {
        let sensitivity_table = self.tables.sensitivity();
        let key = sensitivity_table.resolve_species(species)?;
        if !CLOSED_FORM_SPECIES.contains(&key) {
            return Err(ResponseError::UnknownSpecies(species.to_string()));
        }

        let upper_altitude_km = CLOSED_FORM_BASE_ALTITUDE_KM + CLOSED_FORM_SPAN_KM;
        let lower = sensitivity_table.value_at(key, CLOSED_FORM_BASE_ALTITUDE_KM, region)?;
        let upper = sensitivity_table.value_at(key, upper_altitude_km, region)?;

        let offset = altitude_change_km + (reference_altitude_km - CLOSED_FORM_BASE_ALTITUDE_KM);
        Ok(lower + (upper - lower) / CLOSED_FORM_SPAN_KM * offset)
    }

    /// Emission term from the closed-form interpolation.
    pub fn calculate_closed_form(
        &self,
        reference_altitude_km: FloatValue,
        altitude_change_km: FloatValue,
        emissions: &Emissions,
        region: Region,
    ) -> ResponseResult<EmissionTerm> {
        let mode = self.tables.mode();

        let contributions = emissions
            .iter()
            .map(|(species, magnitude)| {
                let sensitivity = self.closed_form_sensitivity(
                    species,
                    reference_altitude_km,
                    altitude_change_km,
                    region,
                )?;
                Ok((
                    species.to_string(),
                    mode.scale_emission_response(magnitude * sensitivity),
                ))
            })
            .collect::<ResponseResult<BTreeMap<_, _>>>()?;

        Ok(self.finish(reference_altitude_km + altitude_change_km, contributions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ozrf_core::{EmbeddedTables, Mode, TableProvider};

    fn tables(mode: Mode) -> TableSet {
        EmbeddedTables.load(mode, true).unwrap()
    }

    #[test]
    fn test_breakpoint_is_exact() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);
        let emissions = Emissions::new().with("SO", 2.8224);

        let raw = tables
            .sensitivity()
            .value_at("SO", 20.4, Region::SouthArabianSea)
            .unwrap();
        let term = response
            .calculate(20.4, &emissions, Region::SouthArabianSea)
            .unwrap();

        assert_eq!(term.value, 2.8224 * raw / 1000.0);
        assert_relative_eq!(term.value, -0.1118, epsilon = 1e-3);
        assert!(term.is_in_range());
    }

    #[test]
    fn test_radiative_forcing_is_unscaled() {
        let tables = tables(Mode::RadiativeForcing);
        let term = EmissionResponse::new(&tables)
            .calculate(
                16.2,
                &Emissions::new().with("NO", 43.2),
                Region::TransatlanticCorridor,
            )
            .unwrap();
        assert_relative_eq!(term.value, 1.6552, epsilon = 1e-3);
    }

    #[test]
    fn test_linear_in_magnitude() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);
        let region = Region::TransatlanticCorridor;

        let base = Emissions::new().with("NO", 43.2).with("H2O", 3.36);
        let doubled = Emissions::new().with("NO", 86.4).with("H2O", 3.36);

        let base = response.calculate(17.5, &base, region).unwrap();
        let doubled = response.calculate(17.5, &doubled, region).unwrap();

        assert_relative_eq!(
            doubled.contributions["NO"],
            2.0 * base.contributions["NO"],
            epsilon = 1e-15
        );
        assert_eq!(doubled.contributions["H2O"], base.contributions["H2O"]);
    }

    #[test]
    fn test_interpolates_between_rows() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);

        let low = response
            .sensitivity("NO", 16.2, Region::TransatlanticCorridor)
            .unwrap();
        let high = response
            .sensitivity("NO", 20.4, Region::TransatlanticCorridor)
            .unwrap();
        let mid = response
            .sensitivity("NO", 18.3, Region::TransatlanticCorridor)
            .unwrap();

        assert_relative_eq!(mid, (low + high) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range_is_clamped_and_flagged() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);
        let emissions = Emissions::new().with("H2O", 3.36);

        let high = response
            .calculate(50.0, &emissions, Region::SouthArabianSea)
            .unwrap();
        let edge = response
            .calculate(20.4, &emissions, Region::SouthArabianSea)
            .unwrap();

        assert!(high.value.is_finite());
        assert_eq!(high.value, edge.value);
        assert_eq!(
            high.coverage,
            AltitudeCoverage::Outside {
                altitude_km: 50.0,
                min_km: 16.2,
                max_km: 20.4
            }
        );
    }

    #[test]
    fn test_unknown_species_fails_whole_call() {
        let tables = tables(Mode::Ozone);
        let emissions = Emissions::new().with("NO", 43.2).with("UNKNOWN", 1.0);

        let err = EmissionResponse::new(&tables)
            .calculate(18.0, &emissions, Region::TransatlanticCorridor)
            .unwrap_err();
        assert!(matches!(err, ResponseError::UnknownSpecies(ref s) if s == "UNKNOWN"));
    }

    #[test]
    fn test_legacy_alias_reported_under_caller_key() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);

        let alias = response
            .calculate(
                17.0,
                &Emissions::new().with("NOx", 10.0),
                Region::SouthArabianSea,
            )
            .unwrap();
        let canonical = response
            .calculate(
                17.0,
                &Emissions::new().with("NO", 10.0),
                Region::SouthArabianSea,
            )
            .unwrap();

        assert_eq!(alias.value, canonical.value);
        assert!(alias.contributions.contains_key("NOx"));
    }

    #[test]
    fn test_closed_form_matches_table_at_rows() {
        for mode in Mode::ALL {
            let tables = tables(mode);
            let response = EmissionResponse::new(&tables);
            for region in Region::CORRIDORS {
                for species in CLOSED_FORM_SPECIES {
                    let at_base = response
                        .closed_form_sensitivity(species, 18.3, -2.1, region)
                        .unwrap();
                    let at_top = response
                        .closed_form_sensitivity(species, 16.2, 4.2, region)
                        .unwrap();

                    assert_relative_eq!(
                        at_base,
                        response.sensitivity(species, 16.2, region).unwrap(),
                        epsilon = 1e-12
                    );
                    assert_relative_eq!(
                        at_top,
                        response.sensitivity(species, 20.4, region).unwrap(),
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn test_closed_form_extrapolates_linearly() {
        let tables = tables(Mode::Ozone);
        let response = EmissionResponse::new(&tables);
        let region = Region::TransatlanticCorridor;

        let low = response.sensitivity("SO", 16.2, region).unwrap();
        let high = response.sensitivity("SO", 20.4, region).unwrap();
        let beyond = response
            .closed_form_sensitivity("SO", 20.4, 4.2, region)
            .unwrap();

        assert_relative_eq!(beyond, high + (high - low), epsilon = 1e-9);
    }

    #[test]
    fn test_closed_form_species_restricted() {
        let tables = tables(Mode::Ozone);
        let err = EmissionResponse::new(&tables)
            .calculate_closed_form(
                18.3,
                0.0,
                &Emissions::new().with("CO2", 1.0),
                Region::TransatlanticCorridor,
            )
            .unwrap_err();
        assert!(err.is_lookup());
    }
}
