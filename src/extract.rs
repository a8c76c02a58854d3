//! Style/prop extraction: reduce an element to what a renderer needs.
//!
//! Style carries paint (colors, borders, typography, padding). Props carry
//! content and behaviour (text, links, items). A transport can then diff a
//! restyle separately from a content edit. Neither function rejects input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::{Element, ElementKind, ShapeType, Spacing};

/// Key-sorted attribute map, so equal bags serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag(BTreeMap<String, Value>);

/// Visual attributes of one element.
pub type StyleBag = Bag;
/// Content/behaviour attributes of one element.
pub type PropBag = Bag;

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert only non-empty strings.
    pub fn insert_str(&mut self, key: &str, value: &str) {
        if !value.trim().is_empty() {
            self.insert(key, value);
        }
    }

    /// Insert only non-zero numbers.
    pub fn insert_nonzero(&mut self, key: &str, value: f64) {
        if value != 0.0 {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Padding sides as written by [`extract_style`]; absent sides are 0.
    pub fn padding(&self) -> Spacing {
        Spacing {
            top: self.f64("paddingTop").unwrap_or(0.0),
            right: self.f64("paddingRight").unwrap_or(0.0),
            bottom: self.f64("paddingBottom").unwrap_or(0.0),
            left: self.f64("paddingLeft").unwrap_or(0.0),
        }
    }
}

fn insert_padding(style: &mut StyleBag, padding: &Spacing) {
    style.insert_nonzero("paddingTop", padding.top);
    style.insert_nonzero("paddingRight", padding.right);
    style.insert_nonzero("paddingBottom", padding.bottom);
    style.insert_nonzero("paddingLeft", padding.left);
}

fn insert_border(style: &mut StyleBag, width: f64, border_style: &str, color: &str) {
    if width > 0.0 {
        style.insert("borderWidth", width);
        style.insert_str("borderStyle", if border_style.is_empty() { "solid" } else { border_style });
        style.insert_str("borderColor", color);
    }
}

/// Visual attributes of `element`. Unrecognised variants get padding only.
pub fn extract_style(element: &Element) -> StyleBag {
    let mut style = StyleBag::new();
    insert_padding(&mut style, &element.padding);

    match &element.kind {
        ElementKind::Text(t) => {
            style.insert_nonzero("fontSize", t.font_size);
            style.insert_str("fontFamily", &t.font_family);
            style.insert_str("color", &t.color);
            style.insert_str("textAlign", &t.text_align);
            style.insert_str("fontWeight", &t.font_weight);
            style.insert_str("textDecoration", &t.text_decoration);
            style.insert_nonzero("lineHeight", t.line_height);
        }
        ElementKind::Image(i) => {
            style.insert_str("objectFit", &i.object_fit);
            style.insert_str("objectPosition", &i.object_position);
            style.insert_str("filter", &i.filter);
        }
        ElementKind::Button(b) => {
            style.insert_str("backgroundColor", &b.background_color);
            style.insert_str("color", &b.text_color);
            style.insert_nonzero("borderRadius", b.border_radius);
        }
        ElementKind::Container(c) => {
            style.insert_str("backgroundColor", &c.background_color);
            style.insert_nonzero("borderRadius", c.border_radius);
            insert_border(&mut style, c.border_width, &c.border_style, &c.border_color);
            style.insert_str("boxShadow", &c.box_shadow);
            style.insert("display", "flex");
            style.insert("flexDirection", c.flex_direction.as_str());
            style.insert("justifyContent", c.justify_content.as_str());
            style.insert("alignItems", c.align_items.as_str());
            style.insert("flexWrap", c.flex_wrap.as_str());
            style.insert_nonzero("gap", c.gap);
        }
        ElementKind::Shape(s) => {
            style.insert_str("backgroundColor", &s.background_color);
            insert_border(&mut style, s.border_width, &s.border_style, &s.border_color);
            match s.shape_type {
                ShapeType::Rectangle => style.insert_nonzero("borderRadius", s.border_radius),
                ShapeType::Circle => style.insert("borderRadius", "50%"),
                ShapeType::Triangle => {
                    style.insert("clipPath", "polygon(50% 0%, 0% 100%, 100% 100%)")
                }
            }
        }
        ElementKind::Accordion(a) => {
            style.insert_str("backgroundColor", &a.background_color);
            style.insert_str("color", &a.text_color);
            insert_border(&mut style, 1.0, "solid", &a.border_color);
        }
        ElementKind::Calendar(c) => {
            style.insert_str("backgroundColor", &c.background_color);
            style.insert_str("accentColor", &c.accent_color);
        }
        ElementKind::Unknown(_) => {}
    }
    style
}

/// Content/behaviour attributes of `element`. Unrecognised variants get none.
pub fn extract_props(element: &Element) -> PropBag {
    let mut props = PropBag::new();
    match &element.kind {
        ElementKind::Text(t) => props.insert("content", t.content.as_str()),
        ElementKind::Image(i) => {
            props.insert("src", i.src.as_str());
            props.insert("alt", i.alt.as_str());
        }
        ElementKind::Button(b) => {
            props.insert("text", b.text.as_str());
            props.insert_str("href", &b.href);
            props.insert_str("variant", &b.variant);
            props.insert_str("size", &b.size);
            if let Some(icon) = &b.icon {
                props.insert_str("icon", icon);
                props.insert("iconPosition", b.icon_position.as_str());
            }
        }
        ElementKind::Container(c) => props.insert("children", c.children.clone()),
        ElementKind::Shape(s) => props.insert("shapeType", s.shape_type.as_str()),
        ElementKind::Accordion(a) => {
            props.insert("items", json!(a.items));
            props.insert("allowMultiple", a.allow_multiple);
            props.insert("defaultOpen", a.default_open.clone());
        }
        ElementKind::Calendar(c) => {
            if let Some(d) = &c.selected_date {
                props.insert("selectedDate", d.as_str());
            }
            if let Some(d) = &c.min_date {
                props.insert("minDate", d.as_str());
            }
            if let Some(d) = &c.max_date {
                props.insert("maxDate", d.as_str());
            }
        }
        ElementKind::Unknown(_) => {}
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_element;
    use crate::model::{ElementType, Spacing};

    #[test]
    fn text_splits_typography_from_content() {
        let el = create_element(ElementType::Text, "t", 0.0, 0.0);
        let style = extract_style(&el);
        let props = extract_props(&el);
        assert_eq!(style.f64("fontSize"), Some(16.0));
        assert_eq!(style.str("color"), Some("#000000"));
        assert!(!style.contains("content"));
        assert_eq!(props.str("content"), Some("새 텍스트"));
        assert!(!props.contains("fontSize"));
    }

    #[test]
    fn button_padding_and_link() {
        let mut el = create_element(ElementType::Button, "b", 0.0, 0.0);
        if let ElementKind::Button(b) = &mut el.kind {
            b.href = "https://example.com".into();
            b.icon = Some("arrow-right".into());
        }
        let style = extract_style(&el);
        assert_eq!(style.padding(), Spacing::new(8.0, 16.0, 8.0, 16.0));
        let props = extract_props(&el);
        assert_eq!(props.str("href"), Some("https://example.com"));
        assert_eq!(props.str("iconPosition"), Some("left"));
    }

    #[test]
    fn empty_href_is_omitted() {
        let el = create_element(ElementType::Button, "b", 0.0, 0.0);
        assert!(!extract_props(&el).contains("href"));
    }

    #[test]
    fn shapes_encode_their_outline() {
        let mut el = create_element(ElementType::Shape, "s", 0.0, 0.0);
        if let ElementKind::Shape(s) = &mut el.kind {
            s.shape_type = ShapeType::Circle;
        }
        assert_eq!(extract_style(&el).str("borderRadius"), Some("50%"));
        assert_eq!(extract_props(&el).str("shapeType"), Some("circle"));
    }

    #[test]
    fn container_carries_flex_config_and_children() {
        let mut el = create_element(ElementType::Container, "c", 0.0, 0.0);
        el.as_container_mut().unwrap().children = vec!["a".into()];
        let style = extract_style(&el);
        assert_eq!(style.str("flexDirection"), Some("column"));
        assert_eq!(style.f64("gap"), Some(8.0));
        assert_eq!(extract_props(&el).get("children"), Some(&json!(["a"])));
    }

    #[test]
    fn unknown_degrades_to_padding_only() {
        let mut el = create_element(ElementType::Text, "u", 0.0, 0.0);
        el.kind = ElementKind::Unknown(Default::default());
        assert!(extract_style(&el).is_empty());
        el.padding = Spacing::uniform(4.0);
        let style = extract_style(&el);
        assert_eq!(style.len(), 4);
        assert!(extract_props(&el).is_empty());
    }
}
