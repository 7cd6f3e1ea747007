//! Portion scaling
//!
//! Turns per-100g densities into absolute amounts for a portion.

/// Amount of a nutrient in `grams` of food with `density_per_100g`.
///
/// No validation: callers guarantee both inputs are non-negative.
pub fn scale(density_per_100g: f64, grams: f64) -> f64 {
    grams / 100.0 * density_per_100g
}

/// Round half away from zero to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
