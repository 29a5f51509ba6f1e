//! Percentage normalization and display

/// Normalize a user-entered earned percentage into a fraction in `[0, 1]`
///
/// Values above 1 are taken to be on the 0–100 scale and divided by 100
/// before clamping. Non-numeric input (NaN) collapses to 0.
#[must_use]
pub fn normalize_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let scaled = if value > 1.0 { value / 100.0 } else { value };
    scaled.clamp(0.0, 1.0)
}

/// Render a fraction as a percentage with two decimals, e.g. `0.3` → `30.00%`
#[must_use]
pub fn format_percentage(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
