//! FILENAME: pivot-data/src/number_format.rs
//! PURPOSE: Number formatting for aggregate values.
//! CONTEXT: Aggregators hand a formatter to the renderer; sums and averages use
//! two decimals with a thousands separator, counts use none.

use serde::{Deserialize, Serialize};

/// How an aggregate value is turned into display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    /// Shortest representation that reads back as the same value.
    General,
    /// Fixed decimals with an optional thousands separator.
    Number {
        decimal_places: u8,
        use_thousands_separator: bool,
    },
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::General
    }
}

impl NumberFormat {
    pub fn fixed(decimal_places: u8) -> Self {
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator: true,
        }
    }
}

/// Format a number according to the specified format.
/// Non-finite values render as empty text.
pub fn format_number(value: f64, format: &NumberFormat) -> String {
    if !value.is_finite() {
        return String::new();
    }
    match format {
        NumberFormat::General => shortest(value),
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator,
        } => fixed_decimals(value, *decimal_places as usize, *use_thousands_separator),
    }
}

/// Shortest text that reads back as the same value.
fn shortest(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn fixed_decimals(value: f64, decimals: usize, grouped: bool) -> String {
    let magnitude = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match magnitude.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (magnitude.as_str(), None),
    };

    let mut out = String::with_capacity(magnitude.len() + whole.len() / 3 + 1);
    // Values that round to zero lose their sign
    if value < 0.0 && magnitude.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    if grouped {
        out.push_str(&group_thousands(whole));
    } else {
        out.push_str(whole);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Inserts `,` between groups of three ASCII digits, counted from the right.
fn group_thousands(digits: &str) -> String {
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().map(|&b| b as char).collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
}
