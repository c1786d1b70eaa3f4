//! Loading coefficient tables
//!
//! Tables are comma separated text with a header row. Fields may be padded
//! with spaces (the shipped files use `", "` as separator). The sensitivity
//! tables need the columns `Emission`, `Altitude_km`, `Transatlantic_Corridor`
//! and `South_Arabian_Sea`; the Taylor tables need `Parameter` and the two
//! corridor columns. Other columns are ignored.
//!
//! Each mode has its own pair of files:
//!
//! | Mode                | Sensitivity                         | Taylor                               |
//! |---------------------|-------------------------------------|--------------------------------------|
//! | `Ozone`             | `sensitivity_ozone.csv`             | `taylor_param_ozone.csv`             |
//! | `Radiative_Forcing` | `sensitivity_radiative_forcing.csv` | `taylor_param_radiative_forcing.csv` |

use crate::errors::{ResponseError, ResponseResult};
use crate::tables::{
    CorridorValues, SensitivityRow, SensitivityTable, TableSet, TaylorKey, TaylorRow, TaylorTable,
};
use crate::types::{FloatValue, Mode};
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Placeholder used in `Altitude_km` for rows without an altitude.
const NO_ALTITUDE: &str = "-";

const SENSITIVITY_COLUMNS: [&str; 4] = [
    "Emission",
    "Altitude_km",
    "Transatlantic_Corridor",
    "South_Arabian_Sea",
];
const TAYLOR_COLUMNS: [&str; 3] = ["Parameter", "Transatlantic_Corridor", "South_Arabian_Sea"];

/// Source of the coefficient tables.
///
/// Evaluators never load tables themselves. A provider is asked once per mode
/// and the resulting [`TableSet`] is shared by reference.
pub trait TableProvider {
    /// Load the tables for `mode`, adding the derived region columns when
    /// `prepared` is set.
    fn load(&self, mode: Mode, prepared: bool) -> ResponseResult<TableSet>;

    /// Load tables for a mode given by name (`"Ozone"` or `"Radiative_Forcing"`).
    fn load_named(&self, mode: &str, prepared: bool) -> ResponseResult<TableSet> {
        self.load(mode.parse()?, prepared)
    }
}

/// File name of the sensitivity table for a mode.
pub fn sensitivity_file_name(mode: Mode) -> String {
    format!("sensitivity_{}.csv", mode.label().to_lowercase())
}

/// File name of the Taylor parameter table for a mode.
pub fn taylor_file_name(mode: Mode) -> String {
    format!("taylor_param_{}.csv", mode.label().to_lowercase())
}

/// The tables shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTables;

impl EmbeddedTables {
    fn sources(mode: Mode) -> (&'static str, &'static str) {
        match mode {
            Mode::Ozone => (
                include_str!("../data/sensitivity_ozone.csv"),
                include_str!("../data/taylor_param_ozone.csv"),
            ),
            Mode::RadiativeForcing => (
                include_str!("../data/sensitivity_radiative_forcing.csv"),
                include_str!("../data/taylor_param_radiative_forcing.csv"),
            ),
        }
    }
}

impl TableProvider for EmbeddedTables {
    fn load(&self, mode: Mode, prepared: bool) -> ResponseResult<TableSet> {
        debug!("Loading embedded {mode} tables (prepared={prepared})");
        let (sensitivity, taylor) = Self::sources(mode);
        read_table_set(mode, sensitivity.as_bytes(), taylor.as_bytes(), prepared)
    }
}

/// Tables read from a directory holding the per-mode files.
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    root: PathBuf,
}

impl DirectoryTables {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TableProvider for DirectoryTables {
    fn load(&self, mode: Mode, prepared: bool) -> ResponseResult<TableSet> {
        let sensitivity_path = self.root.join(sensitivity_file_name(mode));
        let taylor_path = self.root.join(taylor_file_name(mode));
        debug!(
            "Loading {mode} tables from {} and {} (prepared={prepared})",
            sensitivity_path.display(),
            taylor_path.display()
        );

        read_table_set(
            mode,
            File::open(&sensitivity_path)?,
            File::open(&taylor_path)?,
            prepared,
        )
    }
}

/// Parse a sensitivity table and a Taylor table into a [`TableSet`].
pub fn read_table_set<S: Read, T: Read>(
    mode: Mode,
    sensitivity: S,
    taylor: T,
    prepared: bool,
) -> ResponseResult<TableSet> {
    let tables = TableSet::new(
        mode,
        read_sensitivity_table(sensitivity)?,
        read_taylor_table(taylor)?,
    )?;
    Ok(if prepared { tables.prepared() } else { tables })
}

#[derive(Deserialize)]
struct SensitivityRecord {
    #[serde(rename = "Emission")]
    emission: String,
    #[serde(rename = "Altitude_km")]
    altitude_km: String,
    #[serde(rename = "Transatlantic_Corridor")]
    transatlantic_corridor: FloatValue,
    #[serde(rename = "South_Arabian_Sea")]
    south_arabian_sea: FloatValue,
}

#[derive(Deserialize)]
struct TaylorRecord {
    #[serde(rename = "Parameter")]
    parameter: String,
    #[serde(rename = "Transatlantic_Corridor")]
    transatlantic_corridor: FloatValue,
    #[serde(rename = "South_Arabian_Sea")]
    south_arabian_sea: FloatValue,
}

fn reader<R: Read>(source: R, required: &[&str]) -> ResponseResult<csv::Reader<R>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = rdr.headers()?;
    let missing: Vec<&str> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ResponseError::DataIntegrity(format!(
            "table is missing required columns: {}",
            missing.join(", ")
        )));
    }
    Ok(rdr)
}

fn parse_altitude(emission: &str, field: &str) -> ResponseResult<Option<FloatValue>> {
    if field == NO_ALTITUDE {
        return Ok(None);
    }
    field.parse::<FloatValue>().map(Some).map_err(|_| {
        ResponseError::DataIntegrity(format!(
            "invalid altitude '{field}' for emission '{emission}'"
        ))
    })
}

/// Parse a sensitivity table.
pub fn read_sensitivity_table<R: Read>(source: R) -> ResponseResult<SensitivityTable> {
    let mut rdr = reader(source, &SENSITIVITY_COLUMNS)?;
    let mut rows = vec![];

    for result in rdr.deserialize() {
        let record: SensitivityRecord = result?;
        let altitude_km = parse_altitude(&record.emission, &record.altitude_km)?;
        rows.push(SensitivityRow {
            emission: record.emission,
            altitude_km,
            values: CorridorValues::new(record.transatlantic_corridor, record.south_arabian_sea),
        });
    }

    SensitivityTable::from_rows(rows)
}

/// Parse a Taylor parameter table.
pub fn read_taylor_table<R: Read>(source: R) -> ResponseResult<TaylorTable> {
    let mut rdr = reader(source, &TAYLOR_COLUMNS)?;
    let mut rows = vec![];

    for result in rdr.deserialize() {
        let record: TaylorRecord = result?;
        let key = TaylorKey::parse(&record.parameter);
        if key.is_none() {
            debug!("Ignoring Taylor parameter '{}'", record.parameter);
        }
        rows.push(TaylorRow {
            parameter: record.parameter,
            key,
            values: CorridorValues::new(record.transatlantic_corridor, record.south_arabian_sea),
        });
    }

    TaylorTable::from_rows(rows)
}
