//! Element factory and id generation.

use rand::Rng;

use crate::model::{
    AccordionElement, ButtonElement, CalendarElement, ContainerElement, Dimension, Element,
    ElementKind, ElementType, ImageElement, ShapeElement, Spacing, TextElement,
};
use crate::Result;

/// Default drop position when the caller doesn't supply one.
pub const DEFAULT_POSITION: (f64, f64) = (100.0, 100.0);

const ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short random base-36 token.
///
/// Fine for elements created in one editing session; not globally unique.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Build a default element of `element_type` at `(x, y)`.
pub fn create_element(element_type: ElementType, id: impl Into<String>, x: f64, y: f64) -> Element {
    let (width, height, padding, kind) = match element_type {
        ElementType::Text => (200.0, 50.0, Spacing::default(), ElementKind::Text(TextElement::default())),
        ElementType::Image => (200.0, 150.0, Spacing::default(), ElementKind::Image(ImageElement::default())),
        ElementType::Button => (
            120.0,
            40.0,
            Spacing::symmetric(8.0, 16.0),
            ElementKind::Button(ButtonElement::default()),
        ),
        ElementType::Container => (
            300.0,
            200.0,
            Spacing::uniform(16.0),
            ElementKind::Container(ContainerElement::default()),
        ),
        ElementType::Shape => (100.0, 100.0, Spacing::default(), ElementKind::Shape(ShapeElement::default())),
        ElementType::Accordion => (
            300.0,
            200.0,
            Spacing::default(),
            ElementKind::Accordion(AccordionElement::default()),
        ),
        ElementType::Calendar => (
            280.0,
            300.0,
            Spacing::uniform(12.0),
            ElementKind::Calendar(CalendarElement::default()),
        ),
    };

    Element {
        id: id.into(),
        x,
        y,
        z_index: 0,
        width: Dimension::Fixed(width),
        height: Dimension::Fixed(height),
        padding,
        margin: Spacing::default(),
        parent_id: None,
        kind,
    }
}

/// String-tagged entry point used by the editor and the CLI.
///
/// Fails with `Error::UnknownVariant` for a tag outside [`ElementType::ALL`].
pub fn create_element_by_name(type_name: &str, id: impl Into<String>, x: f64, y: f64) -> Result<Element> {
    let element_type: ElementType = type_name.parse()?;
    Ok(create_element(element_type, id, x, y))
}
