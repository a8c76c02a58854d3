//! Element variants and the shared geometric fields.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{css_keyword, lenient};
use crate::geometry::{parse_number, resolve_padding};

/// A declared width or height.
///
/// `Auto` is resolved to a concrete per-variant size by the geometry
/// resolver; it is never handed to a renderer as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    Fixed(f64),
    #[default]
    Auto,
}

impl Dimension {
    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            Dimension::Fixed(v) => Some(*v),
            Dimension::Auto => None,
        }
    }
}

impl From<f64> for Dimension {
    fn from(v: f64) -> Self {
        Dimension::Fixed(v)
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Dimension::Fixed(v) => s.serialize_f64(*v),
            Dimension::Auto => s.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(match raw {
            Value::Number(n) => n.as_f64().map(Dimension::Fixed).unwrap_or_default(),
            Value::String(s) if s.trim().eq_ignore_ascii_case("auto") => Dimension::Auto,
            Value::String(s) => parse_number(&s).map(Dimension::Fixed).unwrap_or_default(),
            _ => Dimension::Auto,
        })
    }
}

/// Per-side spacing in pixels. Used for padding and margin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Spacing {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Spacing {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    /// Same value on every side.
    pub fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    /// Vertical / horizontal pair, CSS two-value order.
    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

impl<'de> Deserialize<'de> for Spacing {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(d)?;
        let Value::Object(map) = raw else {
            return Ok(Spacing::default());
        };
        Ok(Spacing {
            top: resolve_padding(map.get("top")),
            right: resolve_padding(map.get("right")),
            bottom: resolve_padding(map.get("bottom")),
            left: resolve_padding(map.get("left")),
        })
    }
}

css_keyword! {
    /// Which of the supported outlines a shape draws.
    pub enum ShapeType {
        #[default]
        Rectangle => "rectangle",
        Circle => "circle",
        Triangle => "triangle",
    }
}

css_keyword! {
    pub enum IconPosition {
        #[default]
        Left => "left",
        Right => "right",
    }
}

css_keyword! {
    pub enum FlexDirection {
        #[default]
        Row => "row",
        Column => "column",
        RowReverse => "row-reverse",
        ColumnReverse => "column-reverse",
    }
}

impl FlexDirection {
    pub fn is_row(&self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

css_keyword! {
    pub enum JustifyContent {
        #[default]
        FlexStart => "flex-start",
        Center => "center",
        FlexEnd => "flex-end",
        SpaceBetween => "space-between",
        SpaceAround => "space-around",
        SpaceEvenly => "space-evenly",
    }
}

css_keyword! {
    pub enum AlignItems {
        #[default]
        FlexStart => "flex-start",
        Center => "center",
        FlexEnd => "flex-end",
        Stretch => "stretch",
    }
}

css_keyword! {
    pub enum FlexWrap {
        #[default]
        NoWrap => "nowrap",
        Wrap => "wrap",
    }
}

/// Variant tags accepted by the element factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Text,
    Image,
    Button,
    Container,
    Shape,
    Accordion,
    Calendar,
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        ElementType::Text,
        ElementType::Image,
        ElementType::Button,
        ElementType::Container,
        ElementType::Shape,
        ElementType::Accordion,
        ElementType::Calendar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::Image => "image",
            ElementType::Button => "button",
            ElementType::Container => "container",
            ElementType::Shape => "shape",
            ElementType::Accordion => "accordion",
            ElementType::Calendar => "calendar",
        }
    }
}

impl std::str::FromStr for ElementType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownVariant(s.to_string()))
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextElement {
    #[serde(deserialize_with = "lenient::string")]
    pub content: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub font_size: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub font_family: String,
    #[serde(deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text_align: String,
    #[serde(deserialize_with = "lenient::string")]
    pub font_weight: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text_decoration: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub line_height: f64,
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            content: "새 텍스트".to_string(),
            font_size: 16.0,
            font_family: "inherit".to_string(),
            color: "#000000".to_string(),
            text_align: "left".to_string(),
            font_weight: "normal".to_string(),
            text_decoration: "none".to_string(),
            line_height: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageElement {
    #[serde(deserialize_with = "lenient::string")]
    pub src: String,
    #[serde(deserialize_with = "lenient::string")]
    pub alt: String,
    #[serde(deserialize_with = "lenient::string")]
    pub object_fit: String,
    #[serde(deserialize_with = "lenient::string")]
    pub object_position: String,
    #[serde(deserialize_with = "lenient::string")]
    pub filter: String,
}

impl Default for ImageElement {
    fn default() -> Self {
        Self {
            src: String::new(),
            alt: "이미지".to_string(),
            object_fit: "cover".to_string(),
            object_position: "center".to_string(),
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonElement {
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub href: String,
    #[serde(deserialize_with = "lenient::string")]
    pub variant: String,
    #[serde(deserialize_with = "lenient::string")]
    pub size: String,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub icon_position: IconPosition,
    #[serde(deserialize_with = "lenient::string")]
    pub background_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text_color: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub border_radius: f64,
}

impl Default for ButtonElement {
    fn default() -> Self {
        Self {
            text: "버튼".to_string(),
            href: String::new(),
            variant: "default".to_string(),
            size: "default".to_string(),
            icon: None,
            icon_position: IconPosition::Left,
            background_color: "#3b82f6".to_string(),
            text_color: "#ffffff".to_string(),
            border_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerElement {
    #[serde(deserialize_with = "lenient::string")]
    pub background_color: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub border_radius: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub border_style: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub border_width: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub border_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub box_shadow: String,
    pub flex_direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub flex_wrap: FlexWrap,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub gap: f64,
    /// Ordered ids of the elements laid out inside this container.
    /// The elements themselves live in the canvas's flat list.
    #[serde(deserialize_with = "lenient::string_list")]
    pub children: Vec<String>,
}

impl Default for ContainerElement {
    fn default() -> Self {
        Self {
            background_color: "#f8fafc".to_string(),
            border_radius: 8.0,
            border_style: "solid".to_string(),
            border_width: 1.0,
            border_color: "#e2e8f0".to_string(),
            box_shadow: String::new(),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::FlexStart,
            align_items: AlignItems::FlexStart,
            flex_wrap: FlexWrap::NoWrap,
            gap: 8.0,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeElement {
    pub shape_type: ShapeType,
    #[serde(deserialize_with = "lenient::string")]
    pub background_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub border_color: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub border_width: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub border_style: String,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub border_radius: f64,
}

impl Default for ShapeElement {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rectangle,
            background_color: "#94a3b8".to_string(),
            border_color: "transparent".to_string(),
            border_width: 0.0,
            border_style: "solid".to_string(),
            border_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccordionItem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccordionElement {
    pub items: Vec<AccordionItem>,
    #[serde(deserialize_with = "lenient::bool_or_false")]
    pub allow_multiple: bool,
    #[serde(deserialize_with = "lenient::string_list")]
    pub default_open: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub background_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub border_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text_color: String,
}

impl Default for AccordionElement {
    fn default() -> Self {
        let items = (1..=3)
            .map(|n| AccordionItem {
                id: format!("item-{}", n),
                title: format!("항목 {}", n),
                content: format!("항목 {}의 내용입니다.", n),
            })
            .collect();
        Self {
            items,
            allow_multiple: false,
            default_open: Vec::new(),
            background_color: "#ffffff".to_string(),
            border_color: "#e2e8f0".to_string(),
            text_color: "#0f172a".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarElement {
    /// ISO `YYYY-MM-DD`
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub accent_color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub background_color: String,
}

impl Default for CalendarElement {
    fn default() -> Self {
        Self {
            selected_date: None,
            min_date: None,
            max_date: None,
            accent_color: "#3b82f6".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

/// An element whose `type` this version doesn't understand, or that has
/// none. The raw tag and variant fields are kept verbatim so saving the
/// canvas writes them back unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnknownElement {
    pub tag: Option<String>,
    pub fields: Map<String, Value>,
}

/// Variant-specific payload, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
    Button(ButtonElement),
    Container(ContainerElement),
    Shape(ShapeElement),
    Accordion(AccordionElement),
    Calendar(CalendarElement),
    /// Loads and renders as an empty box.
    Unknown(UnknownElement),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum KnownRef<'a> {
    Text(&'a TextElement),
    Image(&'a ImageElement),
    Button(&'a ButtonElement),
    Container(&'a ContainerElement),
    Shape(&'a ShapeElement),
    Accordion(&'a AccordionElement),
    Calendar(&'a CalendarElement),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Known {
    Text(TextElement),
    Image(ImageElement),
    Button(ButtonElement),
    Container(ContainerElement),
    Shape(ShapeElement),
    Accordion(AccordionElement),
    Calendar(CalendarElement),
}

impl From<Known> for ElementKind {
    fn from(known: Known) -> Self {
        match known {
            Known::Text(v) => ElementKind::Text(v),
            Known::Image(v) => ElementKind::Image(v),
            Known::Button(v) => ElementKind::Button(v),
            Known::Container(v) => ElementKind::Container(v),
            Known::Shape(v) => ElementKind::Shape(v),
            Known::Accordion(v) => ElementKind::Accordion(v),
            Known::Calendar(v) => ElementKind::Calendar(v),
        }
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let known = match self {
            ElementKind::Text(v) => KnownRef::Text(v),
            ElementKind::Image(v) => KnownRef::Image(v),
            ElementKind::Button(v) => KnownRef::Button(v),
            ElementKind::Container(v) => KnownRef::Container(v),
            ElementKind::Shape(v) => KnownRef::Shape(v),
            ElementKind::Accordion(v) => KnownRef::Accordion(v),
            ElementKind::Calendar(v) => KnownRef::Calendar(v),
            ElementKind::Unknown(raw) => {
                let mut map = s.serialize_map(None)?;
                if let Some(tag) = &raw.tag {
                    map.serialize_entry("type", tag)?;
                }
                for (key, value) in &raw.fields {
                    map.serialize_entry(key, value)?;
                }
                return map.end();
            }
        };
        known.serialize(s)
    }
}

impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(d)?;
        let tag = match fields.get("type") {
            Some(Value::String(tag)) => Some(tag.clone()),
            _ => None,
        };
        if tag.as_deref().is_some_and(|t| t.parse::<ElementType>().is_ok()) {
            match Known::deserialize(Value::Object(fields.clone())) {
                Ok(known) => return Ok(known.into()),
                Err(e) => log::warn!("keeping unreadable {:?} element as-is: {}", tag, e),
            }
        }
        // a non-string tag is kept among the raw fields
        if tag.is_some() {
            fields.remove("type");
        }
        Ok(ElementKind::Unknown(UnknownElement { tag, fields }))
    }
}

impl ElementKind {
    /// Wire tag for this variant. Unrecognised elements report `"unknown"`;
    /// see [`ElementKind::raw_tag`] for what was actually stored.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Button(_) => "button",
            ElementKind::Container(_) => "container",
            ElementKind::Shape(_) => "shape",
            ElementKind::Accordion(_) => "accordion",
            ElementKind::Calendar(_) => "calendar",
            ElementKind::Unknown(_) => "unknown",
        }
    }

    pub fn raw_tag(&self) -> Option<&str> {
        match self {
            ElementKind::Unknown(raw) => raw.tag.as_deref(),
            known => Some(known.type_name()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ElementKind::Unknown(_))
    }

    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            ElementKind::Text(_) => Some(ElementType::Text),
            ElementKind::Image(_) => Some(ElementType::Image),
            ElementKind::Button(_) => Some(ElementType::Button),
            ElementKind::Container(_) => Some(ElementType::Container),
            ElementKind::Shape(_) => Some(ElementType::Shape),
            ElementKind::Accordion(_) => Some(ElementType::Accordion),
            ElementKind::Calendar(_) => Some(ElementType::Calendar),
            ElementKind::Unknown(_) => None,
        }
    }
}

/// One positioned, typed unit of canvas content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub x: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub y: f64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub z_index: i64,
    #[serde(default)]
    pub width: Dimension,
    #[serde(default)]
    pub height: Dimension,
    #[serde(default)]
    pub padding: Spacing,
    /// Carried for the editor; geometry ignores it.
    #[serde(default)]
    pub margin: Spacing,
    /// Weak back-reference to the owning container.
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ElementKind::Container(_))
    }

    pub fn as_container(&self) -> Option<&ContainerElement> {
        match &self.kind {
            ElementKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerElement> {
        match &mut self.kind {
            ElementKind::Container(c) => Some(c),
            _ => None,
        }
    }
}
