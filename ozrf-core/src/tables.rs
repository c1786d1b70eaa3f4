//! Coefficient tables
//!
//! Two table classes drive the response functions:
//!
//! - [`SensitivityTable`]: one row per (emission species, altitude) with the
//!   response per unit emission for each corridor (mDU or mW/m² per unit).
//! - [`TaylorTable`]: one row per Taylor parameter, holding the first and
//!   second order altitude coefficients for each corridor.
//!
//! Both are immutable once built. A [`TableSet`] pairs them for a single
//! [`Mode`] and resolves the Taylor coefficients up front, so malformed tables
//! are rejected at load time rather than on the first evaluation.

use crate::errors::{ResponseError, ResponseResult};
use crate::interpolate::AltitudeProfile;
use crate::types::{FloatValue, Mode, Region};
use is_close::is_close;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns derived from the two corridors when a table is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumns {
    pub mean: FloatValue,
    pub range: FloatValue,
    pub max_val: FloatValue,
    pub min_val: FloatValue,
}

impl DerivedColumns {
    pub fn from_corridors(transatlantic: FloatValue, south_arabian: FloatValue) -> Self {
        let mean = (transatlantic + south_arabian) / 2.0;
        let range = (south_arabian - transatlantic).abs();
        Self {
            mean,
            range,
            max_val: mean + range,
            min_val: mean - range,
        }
    }
}

/// Per-corridor values of a single table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorridorValues {
    pub transatlantic_corridor: FloatValue,
    pub south_arabian_sea: FloatValue,
    pub derived: Option<DerivedColumns>,
}

impl CorridorValues {
    pub fn new(transatlantic_corridor: FloatValue, south_arabian_sea: FloatValue) -> Self {
        Self {
            transatlantic_corridor,
            south_arabian_sea,
            derived: None,
        }
    }

    /// Add the `Mean`, `Range`, `Max_val` and `Min_val` columns.
    pub fn prepared(self) -> Self {
        Self {
            derived: Some(DerivedColumns::from_corridors(
                self.transatlantic_corridor,
                self.south_arabian_sea,
            )),
            ..self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.transatlantic_corridor.is_finite() && self.south_arabian_sea.is_finite()
    }

    /// Read the value of a region column.
    pub fn get(&self, region: Region) -> ResponseResult<FloatValue> {
        let derived = || {
            self.derived
                .ok_or(ResponseError::DerivedColumnUnavailable(region))
        };
        match region {
            Region::TransatlanticCorridor => Ok(self.transatlantic_corridor),
            Region::SouthArabianSea => Ok(self.south_arabian_sea),
            Region::Mean => derived().map(|d| d.mean),
            Region::Range => derived().map(|d| d.range),
            Region::MaxVal => derived().map(|d| d.max_val),
            Region::MinVal => derived().map(|d| d.min_val),
        }
    }
}

/// One row of a sensitivity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub emission: String,
    /// `None` for rows tabulated without an altitude (`-` in the source).
    pub altitude_km: Option<FloatValue>,
    pub values: CorridorValues,
}

/// Sensitivity of the response to each emission species as a function of altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    rows: Vec<SensitivityRow>,
}

/// Legacy species names accepted for the current table keys.
const SPECIES_ALIASES: [(&str, &str); 2] = [("NOx", "NO"), ("SOx", "SO")];

impl SensitivityTable {
    pub fn from_rows(rows: Vec<SensitivityRow>) -> ResponseResult<Self> {
        if let Some(row) = rows
            .iter()
            .find(|r| !r.values.is_finite() || r.altitude_km.is_some_and(|a| !a.is_finite()))
        {
            return Err(ResponseError::DataIntegrity(format!(
                "sensitivity row for '{}' contains a non-finite value",
                row.emission
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[SensitivityRow] {
        &self.rows
    }

    /// Add the derived region columns to every row.
    pub fn prepared(self) -> Self {
        Self {
            rows: self
                .rows
                .into_iter()
                .map(|row| SensitivityRow {
                    values: row.values.prepared(),
                    ..row
                })
                .collect(),
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.rows.iter().all(|r| r.values.derived.is_some())
    }

    pub fn contains_species(&self, species: &str) -> bool {
        self.rows.iter().any(|r| r.emission == species)
    }

    /// Resolve a species key to the key used in the table.
    ///
    /// The literal key wins. Otherwise the legacy aliases `NOx` and `SOx`
    /// resolve to `NO` and `SO`.
    pub fn resolve_species<'a>(&'a self, species: &'a str) -> ResponseResult<&'a str> {
        if self.contains_species(species) {
            return Ok(species);
        }
        SPECIES_ALIASES
            .iter()
            .find(|(alias, target)| *alias == species && self.contains_species(target))
            .map(|(_, target)| *target)
            .ok_or_else(|| ResponseError::UnknownSpecies(species.to_string()))
    }

    /// Distinct species in order of first appearance.
    pub fn species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !species.contains(&row.emission.as_str()) {
                species.push(&row.emission);
            }
        }
        species
    }

    /// Lowest and highest tabulated altitude over all species.
    pub fn altitude_range(&self) -> Option<(FloatValue, FloatValue)> {
        self.rows
            .iter()
            .filter_map(|r| r.altitude_km)
            .fold(None, |acc, z| match acc {
                None => Some((z, z)),
                Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
            })
    }

    /// Altitude profile of a species in one region, sorted by altitude.
    ///
    /// Rows without an altitude are skipped.
    pub fn profile(&self, species: &str, region: Region) -> ResponseResult<AltitudeProfile> {
        let key = self.resolve_species(species)?;
        let points = self
            .rows
            .iter()
            .filter(|r| r.emission == key)
            .filter_map(|r| r.altitude_km.map(|z| (z, r)))
            .map(|(z, r)| r.values.get(region).map(|v| (z, v)))
            .collect::<ResponseResult<Vec<_>>>()?;

        AltitudeProfile::from_points(key, points)
    }

    /// The tabulated value of a species at a given altitude.
    pub fn value_at(
        &self,
        species: &str,
        altitude_km: FloatValue,
        region: Region,
    ) -> ResponseResult<FloatValue> {
        let key = self.resolve_species(species)?;
        let mut matches = self.rows.iter().filter(|r| {
            r.emission == key && r.altitude_km.is_some_and(|z| is_close!(z, altitude_km))
        });
        match (matches.next(), matches.next()) {
            (Some(row), None) => row.values.get(region),
            (None, _) => Err(ResponseError::DataIntegrity(format!(
                "no sensitivity row for '{key}' at {altitude_km} km"
            ))),
            (Some(_), Some(_)) => Err(ResponseError::DataIntegrity(format!(
                "several sensitivity rows for '{key}' at {altitude_km} km"
            ))),
        }
    }
}

/// Order of a Taylor coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaylorOrder {
    First,
    Second,
}

impl TaylorOrder {
    pub fn label(&self) -> &'static str {
        match self {
            TaylorOrder::First => "1st",
            TaylorOrder::Second => "2nd",
        }
    }
}

/// Quantity a Taylor coefficient describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaylorQuantity {
    Altitude,
}

impl TaylorQuantity {
    pub fn label(&self) -> &'static str {
        match self {
            TaylorQuantity::Altitude => "Altitude",
        }
    }
}

/// Typed form of a Taylor parameter name such as `"1st order Altitude Ozone"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaylorKey {
    pub order: TaylorOrder,
    pub quantity: TaylorQuantity,
    pub mode: Mode,
}

impl TaylorKey {
    pub fn new(order: TaylorOrder, quantity: TaylorQuantity, mode: Mode) -> Self {
        Self {
            order,
            quantity,
            mode,
        }
    }

    /// Parse a parameter name. Names that are not Taylor keys give `None`.
    pub fn parse(parameter: &str) -> Option<Self> {
        let mut parts = parameter.split_whitespace();
        let order = match parts.next()? {
            "1st" => TaylorOrder::First,
            "2nd" => TaylorOrder::Second,
            _ => return None,
        };
        if parts.next()? != "order" {
            return None;
        }
        let quantity = match parts.next()? {
            "Altitude" => TaylorQuantity::Altitude,
            _ => return None,
        };
        let mode = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(order, quantity, mode))
    }
}

impl fmt::Display for TaylorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} order {} {}",
            self.order.label(),
            self.quantity.label(),
            self.mode
        )
    }
}

/// One row of a Taylor parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaylorRow {
    pub parameter: String,
    /// `None` when the parameter name is not a recognised Taylor key.
    pub key: Option<TaylorKey>,
    pub values: CorridorValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaylorTable {
    rows: Vec<TaylorRow>,
}

impl TaylorTable {
    pub fn from_rows(rows: Vec<TaylorRow>) -> ResponseResult<Self> {
        if let Some(row) = rows.iter().find(|r| !r.values.is_finite()) {
            return Err(ResponseError::DataIntegrity(format!(
                "Taylor parameter '{}' contains a non-finite value",
                row.parameter
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[TaylorRow] {
        &self.rows
    }

    pub fn prepared(self) -> Self {
        Self {
            rows: self
                .rows
                .into_iter()
                .map(|row| TaylorRow {
                    values: row.values.prepared(),
                    ..row
                })
                .collect(),
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.rows.iter().all(|r| r.values.derived.is_some())
    }

    /// The unique row for `key`.
    pub fn lookup(&self, key: TaylorKey) -> ResponseResult<&TaylorRow> {
        let mut matches = self.rows.iter().filter(|r| r.key == Some(key));
        match (matches.next(), matches.next()) {
            (Some(row), None) => Ok(row),
            (None, _) => Err(ResponseError::DataIntegrity(format!(
                "no Taylor parameter '{key}'"
            ))),
            (Some(_), Some(_)) => Err(ResponseError::DataIntegrity(format!(
                "Taylor parameter '{key}' appears more than once"
            ))),
        }
    }

    /// Resolve the altitude expansion coefficients for a mode.
    pub fn coefficients(&self, mode: Mode) -> ResponseResult<TaylorCoefficients> {
        let first =
            self.lookup(TaylorKey::new(TaylorOrder::First, TaylorQuantity::Altitude, mode))?;
        let second =
            self.lookup(TaylorKey::new(TaylorOrder::Second, TaylorQuantity::Altitude, mode))?;
        Ok(TaylorCoefficients {
            first_order: first.values,
            second_order: second.values,
        })
    }
}

/// Altitude expansion coefficients for every region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaylorCoefficients {
    pub first_order: CorridorValues,
    pub second_order: CorridorValues,
}

impl TaylorCoefficients {
    pub fn for_region(&self, region: Region) -> ResponseResult<AltitudeCoefficients> {
        Ok(AltitudeCoefficients {
            first_order: self.first_order.get(region)?,
            second_order: self.second_order.get(region)?,
        })
    }
}

/// First and second order altitude coefficients of a single region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeCoefficients {
    pub first_order: FloatValue,
    pub second_order: FloatValue,
}

/// The sensitivity and Taylor tables of one mode.
///
/// Construction checks the invariants the evaluators rely on: the Taylor
/// coefficients for the mode resolve uniquely and at least one sensitivity
/// row carries an altitude.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSet {
    mode: Mode,
    sensitivity: SensitivityTable,
    taylor: TaylorTable,
    coefficients: TaylorCoefficients,
    altitude_range: (FloatValue, FloatValue),
}

impl TableSet {
    pub fn new(
        mode: Mode,
        sensitivity: SensitivityTable,
        taylor: TaylorTable,
    ) -> ResponseResult<Self> {
        let coefficients = taylor.coefficients(mode)?;
        let altitude_range = sensitivity.altitude_range().ok_or_else(|| {
            ResponseError::DataIntegrity(
                "sensitivity table has no rows with an altitude".to_string(),
            )
        })?;

        Ok(Self {
            mode,
            sensitivity,
            taylor,
            coefficients,
            altitude_range,
        })
    }

    /// Add the derived region columns to both tables.
    pub fn prepared(self) -> Self {
        let sensitivity = self.sensitivity.prepared();
        let taylor = self.taylor.prepared();
        let coefficients = TaylorCoefficients {
            first_order: self.coefficients.first_order.prepared(),
            second_order: self.coefficients.second_order.prepared(),
        };
        Self {
            sensitivity,
            taylor,
            coefficients,
            ..self
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sensitivity(&self) -> &SensitivityTable {
        &self.sensitivity
    }

    pub fn taylor(&self) -> &TaylorTable {
        &self.taylor
    }

    pub fn coefficients(&self) -> &TaylorCoefficients {
        &self.coefficients
    }

    pub fn is_prepared(&self) -> bool {
        self.sensitivity.is_prepared() && self.taylor.is_prepared()
    }

    /// Lowest and highest altitude in the sensitivity table.
    pub fn altitude_range(&self) -> (FloatValue, FloatValue) {
        self.altitude_range
    }

    /// Fail unless these tables were loaded for `mode`.
    pub fn ensure_mode(&self, mode: Mode) -> ResponseResult<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(ResponseError::Configuration(format!(
                "tables were loaded for {} but {} was requested",
                self.mode, mode
            )))
        }
    }
}
