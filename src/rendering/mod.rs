//! Hybrid renderer: one resolved layout, two outputs (display list and HTML),
//! two modes.
//!
//! The mode is fixed when a [`Renderer`] is built and travels down to every
//! element through [`RenderContext`]. Nothing below this module can change
//! it. The first pass is always a [`RenderPhase::Skeleton`], which carries no
//! selection and no live links, so it is identical for both modes and on
//! every run. [`Renderer::hydrate`] moves to the interactive phase.

pub mod html;
pub mod interaction;
pub mod layout;
pub mod paint;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

pub use interaction::{Action, Gesture, GestureKind, InteractionController};
pub use layout::{FlexConfig, Rect};
pub use paint::{DisplayList, PaintCommand, Stroke};

use crate::flatten::{flatten, FlatElement};
use crate::geometry::Size;
use crate::model::{Canvas, Hierarchy};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Editor,
    Preview,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Editor => "editor",
            RenderMode::Preview => "preview",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "editor" => Ok(RenderMode::Editor),
            "preview" => Ok(RenderMode::Preview),
            other => Err(Error::invalid("mode", format!("unknown render mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    /// First paint: deterministic, interaction-free.
    #[default]
    Skeleton,
    Interactive,
}

/// Everything that shapes one render besides the elements themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub phase: RenderPhase,
    /// Editor selection; ignored in preview and in the skeleton pass.
    pub selected: BTreeSet<String>,
}

impl RenderOptions {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode, ..Default::default() }
    }

    pub fn is_interactive(&self) -> bool {
        self.phase == RenderPhase::Interactive
    }

    pub fn shows_selection(&self, id: &str) -> bool {
        self.mode == RenderMode::Editor && self.is_interactive() && self.selected.contains(id)
    }

    pub fn live_links(&self) -> bool {
        self.mode == RenderMode::Preview && self.is_interactive()
    }
}

/// Resolved inputs shared by the paint and HTML passes.
pub struct RenderContext<'a> {
    pub elements: &'a [FlatElement],
    pub hierarchy: Hierarchy,
    pub rects: Vec<Rect>,
    pub width: f64,
    pub height: f64,
    pub options: &'a RenderOptions,
    order: Vec<usize>,
}

impl<'a> RenderContext<'a> {
    pub fn new(size: Size, elements: &'a [FlatElement], options: &'a RenderOptions) -> Self {
        let hierarchy = Hierarchy::build(elements);
        let rects = layout::layout_elements(elements, &hierarchy);
        let mut ctx = Self {
            elements,
            hierarchy,
            rects,
            width: size.width,
            height: size.height,
            options,
            order: Vec::with_capacity(elements.len()),
        };
        let mut order = Vec::with_capacity(elements.len());
        for root in ctx.sorted(ctx.hierarchy.roots()) {
            ctx.push_subtree(root, &mut order);
        }
        ctx.order = order;
        ctx
    }

    /// `indices` sorted by zIndex, ties by insertion order.
    pub fn sorted(&self, indices: &[usize]) -> Vec<usize> {
        let mut out = indices.to_vec();
        out.sort_by_key(|&i| (self.elements[i].z_index, i));
        out
    }

    fn push_subtree(&self, idx: usize, order: &mut Vec<usize>) {
        order.push(idx);
        for child in self.sorted(self.hierarchy.children_of(idx)) {
            self.push_subtree(child, order);
        }
    }

    /// Every element once: siblings by zIndex, children right after their
    /// container.
    pub fn paint_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }
}

/// Both outputs of one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub html: String,
    pub display_list: DisplayList,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    /// A skeleton-phase renderer for `mode`.
    pub fn new(mode: RenderMode) -> Self {
        Self { options: RenderOptions::new(mode) }
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn mode(&self) -> RenderMode {
        self.options.mode
    }

    pub fn phase(&self) -> RenderPhase {
        self.options.phase
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Leave the skeleton phase. The mode is kept.
    pub fn hydrate(mut self) -> Self {
        self.options.phase = RenderPhase::Interactive;
        self
    }

    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.selected = ids.into_iter().map(Into::into).collect();
    }

    pub fn render(&self, size: Size, elements: &[FlatElement]) -> RenderOutput {
        log::debug!(
            "rendering {} elements ({} {:?})",
            elements.len(),
            self.options.mode,
            self.options.phase
        );
        let ctx = RenderContext::new(size, elements, &self.options);
        RenderOutput {
            html: html::render_html(&ctx),
            display_list: paint::build_display_list(&ctx),
        }
    }

    pub fn render_canvas(&self, canvas: &Canvas) -> RenderOutput {
        self.render(Size::new(canvas.width, canvas.height), &flatten(canvas))
    }

    /// Gesture router bound to this renderer's mode and phase.
    pub fn controller(&self, elements: &[FlatElement]) -> InteractionController {
        InteractionController::new(&self.options, elements)
    }
}

/// SHA-256 hex digest of the skeleton HTML. Mode-independent.
pub fn skeleton_digest(size: Size, elements: &[FlatElement]) -> String {
    let output = Renderer::new(RenderMode::Preview).render(size, elements);
    hex::encode(Sha256::digest(output.html.as_bytes()))
}

/// Normalize a button target into something safe to follow.
///
/// Site-relative paths and fragments pass as written; `http`, `https`,
/// `mailto` and `tel` URLs are normalized; bare host names get `https://`.
/// Everything else, `javascript:` included, yields `None`.
pub fn resolve_href(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('/') || raw.starts_with('#') {
        return Some(raw.to_string());
    }
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "mailto" | "tel").then(|| url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if raw.contains('.') && !raw.contains(char::is_whitespace) {
                Url::parse(&format!("https://{}", raw)).ok().map(|u| u.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
