//! Display list: the renderer-agnostic paint commands for one canvas.

use serde::Serialize;

use super::layout::Rect;
use super::RenderContext;
use crate::flatten::FlatElement;
use crate::icons::Icon;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PaintCommand {
    Box {
        id: String,
        rect: Rect,
        fill: Option<String>,
        stroke: Option<Stroke>,
        corner_radius: f64,
    },
    Ellipse {
        id: String,
        rect: Rect,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Triangle {
        id: String,
        rect: Rect,
        fill: Option<String>,
    },
    Text {
        id: String,
        rect: Rect,
        text: String,
        font_size: f64,
        color: String,
        align: String,
    },
    Image {
        id: String,
        rect: Rect,
        src: String,
        alt: String,
        fit: String,
    },
    Glyph {
        id: String,
        x: f64,
        y: f64,
        glyph: char,
        color: String,
    },
    SelectionRing {
        id: String,
        rect: Rect,
    },
}

impl PaintCommand {
    pub fn element_id(&self) -> &str {
        match self {
            PaintCommand::Box { id, .. }
            | PaintCommand::Ellipse { id, .. }
            | PaintCommand::Triangle { id, .. }
            | PaintCommand::Text { id, .. }
            | PaintCommand::Image { id, .. }
            | PaintCommand::Glyph { id, .. }
            | PaintCommand::SelectionRing { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<PaintCommand>,
    /// Resolved element boxes in paint order, padding included.
    #[serde(skip)]
    regions: Vec<(String, Rect)>,
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, commands: Vec::new(), regions: Vec::new() }
    }

    /// Record the box an element occupies. Later regions sit on top.
    pub fn push_region(&mut self, id: impl Into<String>, rect: Rect) {
        self.regions.push((id.into(), rect));
    }

    /// Topmost element whose resolved box contains `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&str> {
        self.regions
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(id, _)| id.as_str())
    }
}

const SELECTION_RING_OFFSET: f64 = 2.0;
const ACCORDION_HEADER_HEIGHT: f64 = 40.0;
const PLACEHOLDER_FILL: &str = "#e2e8f0";

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn stroke_of(el: &FlatElement) -> Option<Stroke> {
    let width = el.style.f64("borderWidth").filter(|w| *w > 0.0)?;
    let color = non_empty(el.style.str("borderColor")).unwrap_or_else(|| "#000000".to_string());
    Some(Stroke { width, color })
}

fn text_color(el: &FlatElement) -> String {
    non_empty(el.style.str("color")).unwrap_or_else(|| "#000000".to_string())
}

fn paint_element(el: &FlatElement, rect: Rect, out: &mut Vec<PaintCommand>) {
    let id = el.id.clone();
    let fill = non_empty(el.style.str("backgroundColor"));
    let content = rect.inset(&el.style.padding());

    match el.element_type.as_str() {
        "text" => out.push(PaintCommand::Text {
            id,
            rect: content,
            text: el.props.str("content").unwrap_or_default().to_string(),
            font_size: el.style.f64("fontSize").unwrap_or(16.0),
            color: text_color(el),
            align: el.style.str("textAlign").unwrap_or("left").to_string(),
        }),
        "image" => {
            let src = el.props.str("src").unwrap_or_default();
            if src.is_empty() {
                out.push(PaintCommand::Box {
                    id,
                    rect,
                    fill: Some(PLACEHOLDER_FILL.to_string()),
                    stroke: None,
                    corner_radius: 0.0,
                });
            } else {
                out.push(PaintCommand::Image {
                    id,
                    rect,
                    src: src.to_string(),
                    alt: el.props.str("alt").unwrap_or_default().to_string(),
                    fit: el.style.str("objectFit").unwrap_or("cover").to_string(),
                });
            }
        }
        "button" => {
            out.push(PaintCommand::Box {
                id: id.clone(),
                rect,
                fill,
                stroke: None,
                corner_radius: el.style.f64("borderRadius").unwrap_or(0.0),
            });
            let color = text_color(el);
            if let Some(icon) = el.props.str("icon").and_then(Icon::from_name) {
                let right = el.props.str("iconPosition") == Some("right");
                let x = if right { content.x + content.width - 16.0 } else { content.x };
                out.push(PaintCommand::Glyph {
                    id: id.clone(),
                    x,
                    y: content.y,
                    glyph: icon.glyph(),
                    color: color.clone(),
                });
            }
            out.push(PaintCommand::Text {
                id,
                rect: content,
                text: el.props.str("text").unwrap_or_default().to_string(),
                font_size: 14.0,
                color,
                align: "center".to_string(),
            });
        }
        "shape" => match el.props.str("shapeType").unwrap_or("rectangle") {
            "circle" => out.push(PaintCommand::Ellipse { id, rect, fill, stroke: stroke_of(el) }),
            "triangle" => out.push(PaintCommand::Triangle { id, rect, fill }),
            _ => out.push(PaintCommand::Box {
                id,
                rect,
                fill,
                stroke: stroke_of(el),
                corner_radius: el.style.f64("borderRadius").unwrap_or(0.0),
            }),
        },
        "accordion" => {
            out.push(PaintCommand::Box { id: id.clone(), rect, fill, stroke: stroke_of(el), corner_radius: 0.0 });
            let items = el.props.get("items").and_then(|v| v.as_array()).cloned().unwrap_or_default();
            let color = text_color(el);
            for (n, item) in items.iter().enumerate() {
                let top = content.y + n as f64 * ACCORDION_HEADER_HEIGHT;
                if top + ACCORDION_HEADER_HEIGHT > rect.y + rect.height {
                    break;
                }
                out.push(PaintCommand::Text {
                    id: id.clone(),
                    rect: Rect::new(content.x, top, content.width, ACCORDION_HEADER_HEIGHT),
                    text: item.get("title").and_then(|t| t.as_str()).unwrap_or_default().to_string(),
                    font_size: 14.0,
                    color: color.clone(),
                    align: "left".to_string(),
                });
            }
        }
        "calendar" => {
            out.push(PaintCommand::Box { id: id.clone(), rect, fill, stroke: None, corner_radius: 0.0 });
            if let Some(date) = el.props.str("selectedDate") {
                out.push(PaintCommand::Text {
                    id,
                    rect: content,
                    text: date.to_string(),
                    font_size: 14.0,
                    color: non_empty(el.style.str("accentColor")).unwrap_or_else(|| "#000000".into()),
                    align: "center".to_string(),
                });
            }
        }
        // containers and anything unrecognised: a plain box
        _ => out.push(PaintCommand::Box {
            id,
            rect,
            fill,
            stroke: stroke_of(el),
            corner_radius: el.style.f64("borderRadius").unwrap_or(0.0),
        }),
    }
}

/// Paint every element in paint order, then selection rings on top.
pub fn build_display_list(ctx: &RenderContext<'_>) -> DisplayList {
    let mut list = DisplayList::new(ctx.width, ctx.height);
    for idx in ctx.paint_order() {
        let el = &ctx.elements[idx];
        paint_element(el, ctx.rects[idx], &mut list.commands);
        list.push_region(el.id.as_str(), ctx.rects[idx]);
    }
    for idx in ctx.paint_order() {
        let el = &ctx.elements[idx];
        if ctx.options.shows_selection(&el.id) {
            list.commands.push(PaintCommand::SelectionRing {
                id: el.id.clone(),
                rect: ctx.rects[idx].outset(SELECTION_RING_OFFSET),
            });
        }
    }
    list
}
