//! Piecewise-linear interpolation over a sorted altitude grid.
//!
//! Outside the grid the value at the nearest edge is returned (flat
//! extrapolation). Callers that care whether a point was extrapolated check
//! [`AltitudeProfile::coverage`] before interpolating.

use crate::errors::{ResponseError, ResponseResult};
use crate::types::{AltitudeCoverage, FloatValue};
use ndarray::Array1;

/// Values tabulated against strictly increasing altitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct AltitudeProfile {
    altitudes: Array1<FloatValue>,
    values: Array1<FloatValue>,
}

impl AltitudeProfile {
    /// Build a profile from unsorted `(altitude, value)` pairs.
    ///
    /// The pairs are sorted by altitude. At least two distinct altitudes are
    /// required and repeated altitudes are rejected, since a repeated
    /// breakpoint has no single value to interpolate towards.
    pub fn from_points(
        label: &str,
        mut points: Vec<(FloatValue, FloatValue)>,
    ) -> ResponseResult<Self> {
        if points
            .iter()
            .any(|(a, v)| !a.is_finite() || !v.is_finite())
        {
            return Err(ResponseError::DataIntegrity(format!(
                "{label}: non-finite altitude or value"
            )));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        if points.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(ResponseError::DataIntegrity(format!(
                "{label}: repeated altitude in profile"
            )));
        }
        if points.len() < 2 {
            return Err(ResponseError::DataIntegrity(format!(
                "{label}: at least two distinct altitudes are needed to interpolate, found {}",
                points.len()
            )));
        }

        let (altitudes, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Ok(Self {
            altitudes: Array1::from_vec(altitudes),
            values: Array1::from_vec(values),
        })
    }

    pub fn altitudes(&self) -> &Array1<FloatValue> {
        &self.altitudes
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    pub fn min_altitude(&self) -> FloatValue {
        self.altitudes[0]
    }

    pub fn max_altitude(&self) -> FloatValue {
        self.altitudes[self.altitudes.len() - 1]
    }

    pub fn coverage(&self, altitude_km: FloatValue) -> AltitudeCoverage {
        AltitudeCoverage::classify(altitude_km, self.min_altitude(), self.max_altitude())
    }

    /// Interpolate the profile at `altitude_km`, clamping outside the grid.
    ///
    /// At a breakpoint the tabulated value is returned exactly.
    pub fn interpolate(&self, altitude_km: FloatValue) -> FloatValue {
        let n = self.altitudes.len();
        if altitude_km <= self.altitudes[0] {
            return self.values[0];
        }
        if altitude_km >= self.altitudes[n - 1] {
            return self.values[n - 1];
        }

        // First index with altitude strictly above the target; 1..n by the checks above
        let upper = self
            .altitudes
            .iter()
            .position(|&z| z > altitude_km)
            .unwrap_or(n - 1);
        let lower = upper - 1;

        let (z0, z1) = (self.altitudes[lower], self.altitudes[upper]);
        let (v0, v1) = (self.values[lower], self.values[upper]);
        let t = (altitude_km - z0) / (z1 - z0);
        v0 + t * (v1 - v0)
    }
}
