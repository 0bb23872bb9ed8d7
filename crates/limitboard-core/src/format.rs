//! Display helpers for amounts, percentages and prices.
//!
//! Absent or unparseable input renders as `-`.

const YI: f64 = 100_000_000.0;
const WAN: f64 = 10_000.0;

pub const PLACEHOLDER: &str = "-";

/// Parses a leading decimal number, ignoring surrounding whitespace and any
/// trailing text (`"12.5%"` parses as `12.5`).
pub fn parse_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    trimmed
        .char_indices()
        .map(|(index, ch)| index + ch.len_utf8())
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Amount with `亿` (1e8) or `万` (1e4) units and two decimals.
pub fn format_amount(amount: Option<f64>) -> String {
    let Some(amount) = amount.filter(|value| value.is_finite()) else {
        return String::from(PLACEHOLDER);
    };

    let magnitude = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    if magnitude >= YI {
        format!("{sign}{:.2}亿", magnitude / YI)
    } else if magnitude >= WAN {
        format!("{sign}{:.2}万", magnitude / WAN)
    } else {
        format!("{amount:.2}")
    }
}

/// Percentage with an explicit `+` for positive values.
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|value| value.is_finite()) {
        Some(value) if value > 0.0 => format!("+{value:.decimals$}%"),
        Some(value) => format!("{value:.decimals$}%"),
        None => String::from(PLACEHOLDER),
    }
}

pub fn format_price(price: Option<f64>, decimals: usize) -> String {
    price
        .filter(|value| value.is_finite())
        .map_or_else(|| String::from(PLACEHOLDER), |value| format!("{value:.decimals$}"))
}
