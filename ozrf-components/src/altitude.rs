//! Altitude Response
//!
//! The altitude-only part of the response is a second order Taylor expansion
//! fitted around a fixed baseline of 18.3 km:
//!
//! $$F(x) = a_1 x + \frac{x^2}{2} a_2$$
//!
//! where $x$ is the altitude relative to the baseline and $a_1$, $a_2$ are the
//! first and second order coefficients of the region.
//!
//! Callers may measure altitude changes from any reference altitude $z_{ref}$.
//! The curve is re-based so the term vanishes at the reference:
//!
//! $$\Delta F_{alt}(z) = F(z - 18.3) - F(z_{ref} - 18.3)$$
//!
//! Without the second term every reference other than 18.3 km would carry a
//! constant offset.

use ozrf_core::tables::AltitudeCoefficients;
use ozrf_core::types::TAYLOR_BASELINE_ALTITUDE_KM;
use ozrf_core::{FloatValue, Region, ResponseResult, TableSet};

/// Evaluate the Taylor polynomial at an altitude offset from the baseline.
pub fn taylor_polynomial(offset_km: FloatValue, coefficients: &AltitudeCoefficients) -> FloatValue {
    offset_km * coefficients.first_order + (offset_km.powi(2) / 2.0) * coefficients.second_order
}

/// Altitude term of the response for the mode of a [`TableSet`].
#[derive(Debug, Clone, Copy)]
pub struct AltitudeResponse<'a> {
    tables: &'a TableSet,
}

impl<'a> AltitudeResponse<'a> {
    pub fn new(tables: &'a TableSet) -> Self {
        Self { tables }
    }

    /// Altitude term at `altitude_km` relative to `reference_altitude_km`.
    ///
    /// No range check is made here; the Taylor expansion is evaluated at any
    /// altitude.
    pub fn calculate(
        &self,
        altitude_km: FloatValue,
        region: Region,
        reference_altitude_km: FloatValue,
    ) -> ResponseResult<FloatValue> {
        let coefficients = self.tables.coefficients().for_region(region)?;

        let reference_offset = reference_altitude_km - TAYLOR_BASELINE_ALTITUDE_KM;
        // Kept as change + offset so altitude == reference gives exactly the reference offset
        let offset = (altitude_km - reference_altitude_km) + reference_offset;

        Ok(taylor_polynomial(offset, &coefficients)
            - taylor_polynomial(reference_offset, &coefficients))
    }
}
