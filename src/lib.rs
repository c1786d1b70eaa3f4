//! Ozone and radiative forcing response to aircraft emissions
//!
//! Estimates the change in stratospheric ozone column (DU) or radiative forcing
//! (mW/m²) caused by aircraft emissions of NOx, SOx and H2O at a cruise
//! altitude, relative to a reference altitude and flight corridor. The estimate
//! is a parametrised surrogate of full chemistry simulations:
//!
//! - an altitude term from a second order Taylor expansion around 18.3 km
//! - an emission term from per-species sensitivities interpolated in altitude
//!
//! ```rust
//! use ozrf::{Emissions, Mode, Region, ResponseModel};
//!
//! let model = ResponseModel::embedded()?;
//! let breakdown = model.total_response(
//!     16.2,
//!     &Emissions::new().with("NO", 43.2),
//!     Region::TransatlanticCorridor,
//!     18.3,
//!     Mode::Ozone,
//! )?;
//! assert!(breakdown.total > 0.0);
//! # Ok::<(), ozrf::ResponseError>(())
//! ```

pub mod config;
pub mod model;

pub use config::{RunConfig, Scenario};
pub use model::{ResponseEnvelope, ResponseModel, ScenarioOutcome};
pub use ozrf_components::{
    AltitudeResponse, EmissionResponse, EmissionTerm, ResponseAggregator, ResponseBreakdown,
    SensitivityMethod,
};
pub use ozrf_core::{
    AltitudeCoverage, DirectoryTables, EmbeddedTables, Emissions, FloatValue, Mode, Region,
    ResponseError, ResponseResult, TableProvider, TableSet,
};
