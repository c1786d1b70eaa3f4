//! Core data model for the aircraft emission response functions.
//!
//! The response of stratospheric ozone (DU) or radiative forcing (mW/m²) to
//! aircraft emissions is evaluated from precomputed coefficient tables rather
//! than a chemistry simulation. This crate holds those tables, the keys used to
//! read them and the interpolation shared by the evaluators in
//! `ozrf-components`.

pub mod errors;
pub mod interpolate;
pub mod loader;
pub mod tables;
pub mod types;

pub use errors::{ResponseError, ResponseResult};
pub use loader::{DirectoryTables, EmbeddedTables, TableProvider};
pub use tables::TableSet;
pub use types::{AltitudeCoverage, Emissions, FloatValue, Mode, Region};
