//! Fuzzy numeric parsing for human-readable quantity expressions.
//!
//! Chanmama exports write quantities the way a dashboard displays them:
//! "7.5w~10w" (a range in ten-thousands), "100万", "20.00%", "3000".
//! [`parse_fuzzy`] turns such text into a [`FuzzyNumber`] carrying exact
//! bounds; [`parse_percentage`] handles rate columns where the textual
//! value is a percentage regardless of whether the % sign survived the
//! export. Both are pure functions; unparsable input is a value, not an
//! error, so one bad cell never aborts a table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::Sheet;

/// A number with one decimal point, optionally signed.
const NUMBER: &str = r"-?(?:\d+\.?\d*|\.\d+)";

/// Range shape: number, optional unit, separator, number, optional unit.
/// Separators are normalized to `~` or `-` before matching.
static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({NUMBER})([wk]?)[~\-]({NUMBER})([wk]?)$")).unwrap()
});

/// Single shape: number with optional unit.
static SINGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({NUMBER})([wk]?)$")).unwrap());

/// Parsed form of a fuzzy numeric expression.
///
/// `Range` holds ordered bounds (`min <= max` by construction, whichever
/// side appeared first in the text). `Unparsable` records that the text
/// carried no usable number; it is deliberately not zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FuzzyNumber {
    /// A bounded range such as "7.5w~10w".
    Range { min: f64, max: f64 },
    /// A single value such as "100万" or "3000".
    Single(f64),
    /// Text that expresses no number.
    Unparsable,
}

impl FuzzyNumber {
    /// Lower bound, if the text parsed.
    pub fn min(&self) -> Option<f64> {
        match self {
            Self::Range { min, .. } => Some(*min),
            Self::Single(v) => Some(*v),
            Self::Unparsable => None,
        }
    }

    /// Upper bound, if the text parsed.
    pub fn max(&self) -> Option<f64> {
        match self {
            Self::Range { max, .. } => Some(*max),
            Self::Single(v) => Some(*v),
            Self::Unparsable => None,
        }
    }

    /// Arithmetic mean of the bounds, if the text parsed.
    pub fn avg(&self) -> Option<f64> {
        match self {
            Self::Range { min, max } => Some((min + max) / 2.0),
            Self::Single(v) => Some(*v),
            Self::Unparsable => None,
        }
    }

    /// Whether the text carried a usable number.
    pub fn is_parsed(&self) -> bool {
        !matches!(self, Self::Unparsable)
    }
}

/// Parse a fuzzy quantity expression.
///
/// Magnitude units: w/万/W multiply by 10,000 and k/千/K by 1,000. A
/// trailing % is dropped without scaling; rate columns go through
/// [`parse_percentage`] instead. Null tokens and malformed text come
/// back as [`FuzzyNumber::Unparsable`].
///
/// A `-` between two numbers separates a range; attached to the front
/// of a lone number it is a sign.
pub fn parse_fuzzy(text: &str) -> FuzzyNumber {
    if Sheet::is_null_value(text) {
        return FuzzyNumber::Unparsable;
    }
    let normalized = normalize_numeric_text(text);
    if normalized.is_empty() {
        return FuzzyNumber::Unparsable;
    }

    if let Some(caps) = RANGE_RE.captures(&normalized) {
        let a = side_value(caps.get(1), caps.get(2));
        let b = side_value(caps.get(3), caps.get(4));
        return match (a, b) {
            (Some(a), Some(b)) => FuzzyNumber::Range {
                min: a.min(b),
                max: a.max(b),
            },
            _ => FuzzyNumber::Unparsable,
        };
    }

    if let Some(caps) = SINGLE_RE.captures(&normalized) {
        if let Some(value) = side_value(caps.get(1), caps.get(2)) {
            return FuzzyNumber::Single(value);
        }
    }

    FuzzyNumber::Unparsable
}

/// Parse a rate cell into a fraction.
///
/// The value is divided by 100 whether or not a % sign is present:
/// Chanmama rate columns are percentages either way, the sign just
/// depends on the export path. Null tokens and non-numeric text yield
/// `None`.
pub fn parse_percentage(text: &str) -> Option<f64> {
    if Sheet::is_null_value(text) {
        return None;
    }
    let cleaned: String = text
        .trim()
        .replace("百分比", "")
        .chars()
        .filter(|c| !matches!(c, '%' | '％' | ',' | '，') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().map(|v| v / 100.0)
}

/// Canonicalize a quantity expression before regex matching: unify unit
/// and separator glyphs, drop thousands separators, percent signs and
/// whitespace.
fn normalize_numeric_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match c {
            '万' | 'W' => out.push('w'),
            '千' | 'K' => out.push('k'),
            '～' | '〜' => out.push('~'),
            '—' | '–' => out.push('-'),
            ',' | '，' | '%' | '％' => {}
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Value of one side of a match: number times unit multiplier.
fn side_value(number: Option<regex::Match>, unit: Option<regex::Match>) -> Option<f64> {
    let value: f64 = number?.as_str().parse().ok()?;
    let multiplier = match unit.map(|m| m.as_str()) {
        Some("w") => 10_000.0,
        Some("k") => 1_000.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}
