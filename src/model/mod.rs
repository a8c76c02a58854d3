//! Canvas document model: elements, canvases, pages and websites.
//!
//! The JSON shape mirrors what the editor persists: camelCase keys, the
//! element variant in a `"type"` tag with variant fields flattened next to
//! the shared geometry. Reading is tolerant throughout. Stored canvases
//! are user data and a single bad value must not make a page unreadable.

pub mod canvas;
pub mod element;
pub mod hierarchy;
pub mod site;

pub use canvas::{Canvas, CanvasIssue};
pub use element::{
    AccordionElement, AccordionItem, AlignItems, ButtonElement, CalendarElement,
    ContainerElement, Dimension, Element, ElementKind, ElementType, FlexDirection, FlexWrap,
    IconPosition, ImageElement, JustifyContent, ShapeElement, ShapeType, Spacing, TextElement,
    UnknownElement,
};
pub use hierarchy::{Hierarchy, HierarchyNode};
pub use site::{Page, PageMetadata, Website};

/// Declares a CSS-style keyword enum that reads leniently: unknown or
/// non-string values fall back to the `Default` variant.
macro_rules! css_keyword {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw.trim() {
                    $( $text => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                let raw = serde_json::Value::deserialize(d)?;
                Ok(raw.as_str().and_then($name::parse).unwrap_or_default())
            }
        }
    };
}
pub(crate) use css_keyword;

/// Lenient field readers used through `#[serde(deserialize_with)]`.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::geometry::parse_number;

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// Number or numeric string; anything else reads as 0.
    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(number(&raw).unwrap_or(0.0))
    }

    /// Like [`f64_or_zero`] but rounds to an integer paint order.
    pub fn i64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(number(&raw).map(|v| v.round() as i64).unwrap_or(0))
    }

    /// Strings pass through, numbers and bools are stringified, the rest is empty.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(match raw {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    /// Non-empty string or `None`.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(match raw {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
    }

    pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(match raw {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        })
    }

    /// Array of strings; non-string entries are dropped, non-arrays read as empty.
    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(match raw {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Element array read one entry at a time. Entries that aren't objects
    /// are dropped with a warning; the rest of the canvas still loads.
    pub fn elements<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<super::Element>, D::Error> {
        let raw = Value::deserialize(d)?;
        let Value::Array(items) = raw else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match super::Element::deserialize(item) {
                Ok(el) => Some(el),
                Err(e) => {
                    log::warn!("dropping unreadable element #{}: {}", index, e);
                    None
                }
            })
            .collect())
    }
}
