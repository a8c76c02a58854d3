//! Static HTML output. Containers nest their children here; positions come
//! from the shared layout so the markup and the display list agree.

use std::fmt::Write;

use serde_json::Value;

use super::layout::Rect;
use super::{resolve_href, RenderContext};
use crate::flatten::FlatElement;
use crate::icons::Icon;

const SELECTION_OUTLINE: &str = "outline:2px solid #3b82f6;outline-offset:2px";

// Numeric style values written without a unit.
const UNITLESS: &[&str] = &["lineHeight", "fontWeight", "zIndex", "opacity", "flexGrow"];

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn css_value(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let n = n.as_f64()?;
            if UNITLESS.contains(&key) {
                Some(format!("{}", n))
            } else {
                Some(format!("{}px", n))
            }
        }
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Inline CSS for one element: placement first, then its style bag.
fn inline_style(el: &FlatElement, left: f64, top: f64, rect: &Rect) -> String {
    let mut css = format!(
        "position:absolute;box-sizing:border-box;left:{}px;top:{}px;width:{}px;height:{}px;z-index:{}",
        left, top, rect.width, rect.height, el.z_index
    );
    for (key, value) in el.style.iter() {
        if let Some(v) = css_value(key, value) {
            let _ = write!(css, ";{}:{}", kebab(key), v);
        }
    }
    css
}

struct Writer<'c, 'a> {
    ctx: &'c RenderContext<'a>,
    out: String,
}

impl<'c, 'a> Writer<'c, 'a> {
    fn element(&mut self, idx: usize) {
        let ctx = self.ctx;
        let el = &ctx.elements[idx];
        let rect = ctx.rects[idx];
        let (left, top) = match ctx.hierarchy.parent_of(idx) {
            Some(p) => {
                let border = ctx.elements[p].style.f64("borderWidth").unwrap_or(0.0);
                (rect.x - ctx.rects[p].x - border, rect.y - ctx.rects[p].y - border)
            }
            None => (rect.x, rect.y),
        };
        let mut style = inline_style(el, left, top, &rect);
        let mut class = format!("sc-element sc-{}", escape(&el.element_type));
        if ctx.options.shows_selection(&el.id) {
            class.push_str(" sc-selected");
            style.push(';');
            style.push_str(SELECTION_OUTLINE);
        }
        let attrs = format!(
            "class=\"{}\" data-element-id=\"{}\" data-element-type=\"{}\" style=\"{}\"",
            class,
            escape(&el.id),
            escape(&el.element_type),
            escape(&style)
        );

        match el.element_type.as_str() {
            "text" => {
                let content = el.props.str("content").unwrap_or_default();
                let _ = write!(self.out, "<div {}>{}</div>", attrs, escape(content));
            }
            "image" => match el.props.str("src").filter(|s| !s.is_empty()) {
                Some(src) => {
                    let alt = el.props.str("alt").unwrap_or_default();
                    let _ = write!(self.out, "<img {} src=\"{}\" alt=\"{}\">", attrs, escape(src), escape(alt));
                }
                None => {
                    let _ = write!(self.out, "<div {}></div>", attrs);
                }
            },
            "button" => self.button(el, &attrs),
            "container" => {
                let _ = write!(self.out, "<div {}>", attrs);
                for child in ctx.sorted(ctx.hierarchy.children_of(idx)) {
                    self.element(child);
                }
                self.out.push_str("</div>");
            }
            "accordion" => self.accordion(el, &attrs),
            "calendar" => self.calendar(el, &attrs),
            _ => {
                let _ = write!(self.out, "<div {}></div>", attrs);
            }
        }
    }

    fn button(&mut self, el: &FlatElement, attrs: &str) {
        let text = format!("<span class=\"sc-label\">{}</span>", escape(el.props.str("text").unwrap_or_default()));
        let icon = el.props.str("icon").and_then(Icon::from_name).map(|icon| {
            format!("<span class=\"sc-icon\" data-icon=\"{}\">{}</span>", icon.name(), icon.glyph())
        });
        let inner = match (icon, el.props.str("iconPosition")) {
            (Some(icon), Some("right")) => format!("{}{}", text, icon),
            (Some(icon), _) => format!("{}{}", icon, text),
            (None, _) => text,
        };

        let href = if self.ctx.options.live_links() {
            el.props.str("href").and_then(resolve_href)
        } else {
            None
        };
        match href {
            Some(href) => {
                let _ = write!(self.out, "<a {} href=\"{}\">{}</a>", attrs, escape(&href), inner);
            }
            None => {
                let _ = write!(self.out, "<button type=\"button\" {}>{}</button>", attrs, inner);
            }
        }
    }

    fn accordion(&mut self, el: &FlatElement, attrs: &str) {
        let open: Vec<&str> = el
            .props
            .get("defaultOpen")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let _ = write!(self.out, "<div {}>", attrs);
        if let Some(items) = el.props.get("items").and_then(Value::as_array) {
            for item in items {
                let field = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or_default();
                let id = field("id");
                let open_attr = if open.contains(&id) { " open" } else { "" };
                let _ = write!(
                    self.out,
                    "<details data-item-id=\"{}\"{}><summary>{}</summary><div class=\"sc-accordion-body\">{}</div></details>",
                    escape(id),
                    open_attr,
                    escape(field("title")),
                    escape(field("content"))
                );
            }
        }
        self.out.push_str("</div>");
    }

    fn calendar(&mut self, el: &FlatElement, attrs: &str) {
        let date = el.props.str("selectedDate").unwrap_or_default();
        let _ = write!(self.out, "<div {}>", attrs);
        if self.ctx.options.is_interactive() {
            self.out.push_str("<input type=\"date\"");
            for (attr, key) in [("value", "selectedDate"), ("min", "minDate"), ("max", "maxDate")] {
                if let Some(v) = el.props.str(key) {
                    let _ = write!(self.out, " {}=\"{}\"", attr, escape(v));
                }
            }
            self.out.push('>');
        } else {
            let _ = write!(self.out, "<span class=\"sc-date\">{}</span>", escape(date));
        }
        self.out.push_str("</div>");
    }
}

/// The whole canvas as one `<div class="sc-canvas">` tree.
pub fn render_html(ctx: &RenderContext<'_>) -> String {
    let mut writer = Writer { ctx, out: String::new() };
    let _ = write!(
        writer.out,
        "<div class=\"sc-canvas\" style=\"position:relative;overflow:hidden;width:{}px;height:{}px\">",
        ctx.width, ctx.height
    );
    for root in ctx.sorted(ctx.hierarchy.roots()) {
        writer.element(root);
    }
    writer.out.push_str("</div>");
    writer.out
}
