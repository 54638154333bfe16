//! Result normalization: every float leaf finite and plain.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;

/// Recursively replaces non-finite floats with `0.0`.
///
/// Implementations must be idempotent.
pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for f64 {
    fn sanitize(self) -> Self {
        finite_or_zero(self)
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(self) -> Self {
        self.into_iter().map(Sanitize::sanitize).collect()
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(self) -> Self {
        self.map(Sanitize::sanitize)
    }
}

impl<K: Ord, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize(self) -> Self {
        self.into_iter().map(|(k, v)| (k, v.sanitize())).collect()
    }
}

pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Rounds half away from zero to `dp` decimal places.
pub fn round_to(x: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (x * factor).round() / factor
}

/// Converts a decimal to a plain float; values outside `f64` become `0.0`.
pub fn plain_number(value: Decimal) -> f64 {
    value.to_f64().map(finite_or_zero).unwrap_or(0.0)
}
