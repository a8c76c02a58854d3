//! Geometry resolution: padding normalization and actual box sizes.
//!
//! Everything here is total. Malformed numbers are normalized, never
//! rejected, so a partially corrupt canvas still renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Dimension, Element, ElementKind};

/// Smallest width or height a fixed-size element resolves to.
pub const MIN_RENDERED_SIZE: f64 = 20.0;

/// A resolved box size in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Parse the leading number of `raw`, the way a lenient float parser reads
/// `"12px"` as 12. Returns `None` when no digits lead the string.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize one raw padding value.
///
/// `None` stands for an absent key. Numbers pass through unchanged,
/// negatives included. Numeric strings are parsed. Empty strings, `null`,
/// unparseable strings and every other JSON type become 0.
pub fn resolve_padding(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Size used for an `auto` dimension, per variant.
pub fn auto_size(kind: &ElementKind) -> Size {
    match kind {
        ElementKind::Button(_) => Size::new(100.0, 40.0),
        ElementKind::Accordion(_) => Size::new(300.0, 200.0),
        _ => Size::new(100.0, 100.0),
    }
}

/// Rendered box size of `element`, padding included.
///
/// An `auto` axis takes the variant default and ignores padding. A fixed
/// axis is `declared + leading + trailing padding`, floored at
/// [`MIN_RENDERED_SIZE`]. Consumers must not add padding again.
pub fn resolve_actual_size(element: &Element) -> Size {
    let fallback = auto_size(&element.kind);
    let pad = &element.padding;
    let axis = |declared: Dimension, auto: f64, padding: f64| match declared {
        Dimension::Auto => auto,
        Dimension::Fixed(v) => (v + padding).max(MIN_RENDERED_SIZE),
    };
    Size {
        width: axis(element.width, fallback.width, pad.horizontal()),
        height: axis(element.height, fallback.height, pad.vertical()),
    }
}
