//! Response function evaluators
//!
//! - `altitude`: second order Taylor expansion in altitude, re-based on the
//!   caller's reference altitude
//! - `emissions`: per-species sensitivities interpolated in altitude
//! - `response`: the sum of both terms with a per-species breakdown
//!
//! Evaluators borrow a [`TableSet`](ozrf_core::TableSet) and hold no other
//! state, so they can be created per call and shared across threads.

pub mod altitude;
pub mod emissions;
pub mod response;

pub use altitude::AltitudeResponse;
pub use emissions::{EmissionResponse, EmissionTerm};
pub use response::{ResponseAggregator, ResponseBreakdown, SensitivityMethod};
