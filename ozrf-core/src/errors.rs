use crate::types::Region;
use thiserror::Error;

/// Error type for invalid response-function evaluations.
///
/// Every variant is fatal to the call that produced it. Altitudes outside the
/// tabulated range are not errors; they are reported through
/// [`AltitudeCoverage`](crate::types::AltitudeCoverage) alongside a valid result.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// An unrecognised mode, or tables of one mode used for the other.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unknown region '{0}'. Expected one of Transatlantic_Corridor, South_Arabian_Sea, Mean, Range, Max_val or Min_val")]
    UnknownRegion(String),
    #[error("Emission type '{0}' not found in the sensitivity table")]
    UnknownSpecies(String),
    #[error("Region {0} is a derived column and is only available on prepared tables")]
    DerivedColumnUnavailable(Region),
    /// The coefficient tables do not satisfy their structural invariants.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl ResponseError {
    /// True for the lookup family: unknown region, unknown species or a derived
    /// column requested from raw tables.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            ResponseError::UnknownRegion(_)
                | ResponseError::UnknownSpecies(_)
                | ResponseError::DerivedColumnUnavailable(_)
        )
    }
}

/// Convenience type for `Result<T, ResponseError>`.
pub type ResponseResult<T> = Result<T, ResponseError>;
