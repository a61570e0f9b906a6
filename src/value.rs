// Field values and numeric coercion shared by every consumer

use serde_json::Value;

/// One record of a series, in source field order
pub type Record = serde_json::Map<String, Value>;

/// Ordered records driving one chart
pub type Series = Vec<Record>;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Result of coercing one field value
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Number(f64),
    /// Field absent or null
    Missing,
    /// Present but not numeric; carries the raw text for diagnostics
    Unparseable(String),
}

/// Lexical flavour of a string that parsed as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericText {
    Plain,
    Percentage,
    Currency,
}

/// Coerce a JSON value to a finite number
pub fn coerce(value: Option<&Value>) -> Coerced {
    match value {
        None | Some(Value::Null) => Coerced::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Coerced::Number(v),
            _ => Coerced::Unparseable(n.to_string()),
        },
        Some(Value::String(s)) => match parse_numeric_text(s) {
            Some((v, _)) => Coerced::Number(v),
            None => Coerced::Unparseable(s.clone()),
        },
        Some(other) => Coerced::Unparseable(other.to_string()),
    }
}

/// Parse a pre-formatted numeric string.
///
/// Accepts plain numbers, percentages (a trailing `%` is stripped) and currency
/// amounts (leading symbol and thousands separators are stripped).
/// Non-finite results (`"NaN"`, `"inf"`) are rejected.
pub fn parse_numeric_text(text: &str) -> Option<(f64, NumericText)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (cleaned, kind) = if let Some(number) = trimmed.strip_suffix('%') {
        (number.to_string(), NumericText::Percentage)
    } else if trimmed.contains(|c: char| CURRENCY_SYMBOLS.contains(&c)) {
        let cleaned: String = trimmed
            .chars()
            .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',')
            .collect();
        (cleaned, NumericText::Currency)
    } else {
        (trimmed.to_string(), NumericText::Plain)
    };

    let value = cleaned.trim().parse::<f64>().ok()?;
    if value.is_finite() {
        Some((value, kind))
    } else {
        None
    }
}

/// Render a field value as a display label
pub fn display_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => format_number(v),
            None => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Shortest natural rendering of a number (`1000`, `12.5`)
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
