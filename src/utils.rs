//! Utility functions for the SLDB client

use serde_json::Value;

/// Placeholder written in place of credentials in diagnostic output
pub const REDACTED: &str = "***";

/// Round a value to the given number of decimal places
pub fn round_to_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Render call arguments for tracing, hiding the first `secret_count` values
pub fn redacted_args(args: &[Value], secret_count: usize) -> String {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            if i < secret_count {
                REDACTED.to_string()
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
