//! Gesture routing for rendered elements.
//!
//! Editor mode selects and never navigates. Preview mode navigates and never
//! selects. Before hydration nothing happens at all.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{resolve_href, RenderMode, RenderOptions, RenderPhase};
use crate::flatten::FlatElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Click,
    DoubleClick,
}

/// One pointer gesture. Repeated deliveries share an `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub id: u64,
    pub kind: GestureKind,
    pub target: String,
}

impl Gesture {
    pub fn click(id: u64, target: impl Into<String>) -> Self {
        Self { id, kind: GestureKind::Click, target: target.into() }
    }

    pub fn double_click(id: u64, target: impl Into<String>) -> Self {
        Self { id, kind: GestureKind::DoubleClick, target: target.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Select(String),
    Navigate(String),
}

type Callback = Box<dyn FnMut(&str)>;

// Repeated deliveries of one gesture arrive back to back, so only the
// most recent ids need remembering.
const RECENT_GESTURES: usize = 16;

pub struct InteractionController {
    mode: RenderMode,
    phase: RenderPhase,
    known: HashSet<String>,
    links: HashMap<String, String>,
    handled: VecDeque<u64>,
    on_select: Option<Callback>,
    navigator: Option<Callback>,
}

impl InteractionController {
    pub fn new(options: &RenderOptions, elements: &[FlatElement]) -> Self {
        let links = elements
            .iter()
            .filter(|e| e.is_type("button"))
            .filter_map(|e| {
                let href = resolve_href(e.props.str("href")?)?;
                Some((e.id.clone(), href))
            })
            .collect();
        Self {
            mode: options.mode,
            phase: options.phase,
            known: elements.iter().map(|e| e.id.clone()).collect(),
            links,
            handled: VecDeque::with_capacity(RECENT_GESTURES),
            on_select: None,
            navigator: None,
        }
    }

    pub fn on_select(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    pub fn on_navigate(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.navigator = Some(Box::new(f));
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Route one gesture. Returns the action taken, if any.
    pub fn dispatch(&mut self, gesture: &Gesture) -> Option<Action> {
        if self.phase == RenderPhase::Skeleton || !self.known.contains(&gesture.target) {
            return None;
        }
        match self.mode {
            RenderMode::Editor => {
                if let Some(cb) = self.on_select.as_mut() {
                    cb(&gesture.target);
                }
                Some(Action::Select(gesture.target.clone()))
            }
            RenderMode::Preview => {
                if gesture.kind != GestureKind::DoubleClick {
                    return None;
                }
                let href = self.links.get(&gesture.target)?;
                if self.handled.contains(&gesture.id) {
                    return None;
                }
                if self.handled.len() == RECENT_GESTURES {
                    self.handled.pop_front();
                }
                self.handled.push_back(gesture.id);
                log::debug!("navigating to {} from '{}'", href, gesture.target);
                if let Some(cb) = self.navigator.as_mut() {
                    cb(href);
                }
                Some(Action::Navigate(href.clone()))
            }
        }
    }
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("links", &self.links)
            .finish()
    }
}
