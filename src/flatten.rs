//! Flat-structure conversion: the render-ready projection of a canvas.
//!
//! The canvas is already a flat store, so flattening is a per-element
//! projection in insertion order. Hierarchy travels as `parentId`; paint
//! order is left to the consumer.

use serde::{Deserialize, Serialize};

use crate::extract::{extract_props, extract_style, PropBag, StyleBag};
use crate::geometry::resolve_actual_size;
use crate::model::{Canvas, Element, HierarchyNode};

/// One element as sent to a renderer: geometry resolved, attributes split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub x: f64,
    pub y: f64,
    /// Actual size, padding included.
    pub width: f64,
    pub height: f64,
    pub z_index: i64,
    pub parent_id: Option<String>,
    pub style: StyleBag,
    pub props: PropBag,
}

impl FlatElement {
    pub fn is_type(&self, type_name: &str) -> bool {
        self.element_type == type_name
    }
}

impl HierarchyNode for FlatElement {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn parent_ref(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn is_container(&self) -> bool {
        self.is_type("container")
    }

    fn child_order(&self) -> Vec<&str> {
        self.props
            .get("children")
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Project a single element.
pub fn flatten_element(element: &Element) -> FlatElement {
    let size = resolve_actual_size(element);
    FlatElement {
        id: element.id.clone(),
        element_type: element.type_name().to_string(),
        x: element.x,
        y: element.y,
        width: size.width,
        height: size.height,
        z_index: element.z_index,
        parent_id: element.parent_id.clone(),
        style: extract_style(element),
        props: extract_props(element),
    }
}

/// Something that can produce the flat render sequence.
pub trait Flatten {
    fn flatten(&self) -> Vec<FlatElement>;
}

impl Flatten for Canvas {
    fn flatten(&self) -> Vec<FlatElement> {
        log::debug!("flattening canvas with {} elements", self.elements.len());
        self.elements.iter().map(flatten_element).collect()
    }
}

/// An already-flat sequence flattens to itself.
impl Flatten for [FlatElement] {
    fn flatten(&self) -> Vec<FlatElement> {
        self.to_vec()
    }
}

/// Flatten a canvas in insertion order.
pub fn flatten(canvas: &Canvas) -> Vec<FlatElement> {
    canvas.flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_element;
    use crate::model::ElementType;

    fn nested_canvas() -> Canvas {
        let mut canvas = Canvas::default();
        let mut hero = create_element(ElementType::Container, "hero", 0.0, 0.0);
        hero.z_index = 5;
        canvas.push(hero).unwrap();
        let mut title = create_element(ElementType::Text, "title", 10.0, 10.0);
        title.z_index = 1;
        canvas.push(title).unwrap();
        canvas.push(create_element(ElementType::Button, "cta", 40.0, 80.0)).unwrap();
        canvas.add_to_container("title", "hero").unwrap();
        canvas
    }

    #[test]
    fn keeps_insertion_order_not_paint_order() {
        let flat = flatten(&nested_canvas());
        let ids: Vec<_> = flat.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["hero", "title", "cta"]);
    }

    #[test]
    fn parent_links_survive_as_ids() {
        let flat = flatten(&nested_canvas());
        assert_eq!(flat[1].parent_id.as_deref(), Some("hero"));
        assert_eq!(flat[0].parent_id, None);
        assert_eq!(flat[0].child_order(), vec!["title"]);
    }

    #[test]
    fn sizes_are_actual_sizes() {
        let flat = flatten(&nested_canvas());
        // 120x40 button with 8/16 padding
        assert_eq!((flat[2].width, flat[2].height), (152.0, 56.0));
    }

    #[test]
    fn flattening_twice_is_stable() {
        let canvas = nested_canvas();
        let once = flatten(&canvas);
        assert_eq!(once, flatten(&canvas));
        assert_eq!(once, Flatten::flatten(once.as_slice()));
    }

    #[test]
    fn wire_shape_uses_type_and_null_parent() {
        let flat = flatten(&nested_canvas());
        let json = serde_json::to_value(&flat[0]).unwrap();
        assert_eq!(json["type"], "container");
        assert!(json["parentId"].is_null());
        assert_eq!(json["zIndex"], 5);
    }
}
