//! Editor session: one page's canvas plus the transient state around it
//! (selection, zoom, grid, drag, save status).

pub mod drag;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

pub use drag::{snap_to_grid, DragCommit, DragState, GridGuard, DRAG_THRESHOLD};

use crate::factory::{create_element, generate_id, DEFAULT_POSITION};
use crate::model::{Canvas, Element, ElementType};
use crate::rendering::{RenderMode, RenderOutput, Renderer};
use crate::{Error, Result};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Where canvases get saved. A save replaces the stored canvas wholesale or
/// fails leaving it untouched.
pub trait PageSink {
    fn save_canvas(&self, page_id: &str, canvas: &Canvas) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Failed(String),
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveState::Idle => f.write_str("idle"),
            SaveState::Saving => f.write_str("saving"),
            SaveState::Saved => f.write_str("saved"),
            SaveState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

#[derive(Debug)]
pub struct EditorSession {
    page_id: String,
    canvas: Canvas,
    zoom: f64,
    grid_size: f64,
    show_grid: Rc<Cell<bool>>,
    drag: DragState,
    save_state: SaveState,
    dirty: bool,
}

impl EditorSession {
    pub fn new(page_id: impl Into<String>, canvas: Canvas) -> Self {
        Self {
            page_id: page_id.into(),
            canvas,
            zoom: 1.0,
            grid_size: DEFAULT_GRID_SIZE,
            show_grid: Rc::new(Cell::new(false)),
            drag: DragState::Idle,
            save_state: SaveState::Idle,
            dirty: false,
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Clamped to `MIN_ZOOM..=MAX_ZOOM`; non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn set_grid_size(&mut self, size: f64) {
        if size.is_finite() && size >= 0.0 {
            self.grid_size = size;
        }
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid.get()
    }

    pub fn set_show_grid(&mut self, visible: bool) {
        self.show_grid.set(visible);
    }

    /// Shared handle on grid visibility, for views that outlive a drag.
    pub fn grid_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.show_grid)
    }

    fn touch(&mut self) {
        self.dirty = true;
        if self.save_state == SaveState::Saved {
            self.save_state = SaveState::Idle;
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id();
            if self.canvas.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Add a factory-default element at the default position and select it.
    pub fn add_element(&mut self, element_type: ElementType) -> Result<String> {
        self.add_element_at(element_type, DEFAULT_POSITION.0, DEFAULT_POSITION.1)
    }

    pub fn add_element_at(&mut self, element_type: ElementType, x: f64, y: f64) -> Result<String> {
        let id = self.fresh_id();
        let mut element = create_element(element_type, id.clone(), x, y);
        element.z_index = self.canvas.elements.iter().map(|e| e.z_index + 1).max().unwrap_or(0);
        self.canvas.push(element)?;
        self.select(&id);
        self.touch();
        log::debug!("added {} '{}'", element_type.as_str(), id);
        Ok(id)
    }

    pub fn selection(&self) -> impl Iterator<Item = &str> {
        self.canvas.selected_element_ids.iter().map(String::as_str)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.canvas.selected_element_ids.contains(id)
    }

    /// Replace the selection with `id`. Unknown ids just clear it.
    pub fn select(&mut self, id: &str) {
        self.canvas.selected_element_ids.clear();
        if self.canvas.get(id).is_some() {
            self.canvas.selected_element_ids.insert(id.to_string());
        }
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.canvas.selected_element_ids.remove(id) && self.canvas.get(id).is_some() {
            self.canvas.selected_element_ids.insert(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.canvas.selected_element_ids.clear();
    }

    /// Mutate one element in place. The id can't change.
    pub fn update_with<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Element),
    {
        let element = self.canvas.get_mut(id).ok_or_else(|| Error::not_found("element", id))?;
        f(element);
        element.id = id.to_string();
        self.touch();
        Ok(())
    }

    /// Merge a JSON object of wire-format attributes into an element.
    ///
    /// `id`, `type` and `parentId` are ignored here; use
    /// [`move_into_container`](Self::move_into_container) to re-parent.
    pub fn update_element(&mut self, id: &str, patch: &Value) -> Result<()> {
        let fields = patch
            .as_object()
            .ok_or_else(|| Error::invalid("updates", "expected an object of attributes"))?;
        let current = self.canvas.get(id).ok_or_else(|| Error::not_found("element", id))?;
        let mut merged = serde_json::to_value(current)?;
        if let Some(obj) = merged.as_object_mut() {
            for (key, value) in fields {
                if !matches!(key.as_str(), "id" | "type" | "parentId") {
                    obj.insert(key.clone(), value.clone());
                }
            }
        }
        let updated: Element = serde_json::from_value(merged)?;
        self.update_with(id, move |el| *el = updated)
    }

    /// Remove an element. Children it contained become top-level.
    pub fn delete_element(&mut self, id: &str) -> Result<Element> {
        if self.drag.preview().map(|(dragged, _, _)| dragged == id).unwrap_or(false) {
            self.drag.cancel();
        }
        let removed = self.canvas.remove(id).ok_or_else(|| Error::not_found("element", id))?;
        self.touch();
        Ok(removed)
    }

    pub fn move_into_container(&mut self, child: &str, container: &str) -> Result<()> {
        self.canvas.add_to_container(child, container)?;
        self.touch();
        Ok(())
    }

    pub fn move_to_top_level(&mut self, id: &str) -> Result<()> {
        if self.canvas.get(id).is_none() {
            return Err(Error::not_found("element", id));
        }
        if self.canvas.detach(id).is_some() {
            self.touch();
        }
        Ok(())
    }

    /// Pointer pressed on `id` at screen position `(sx, sy)`.
    pub fn pointer_down(&mut self, id: &str, sx: f64, sy: f64) -> bool {
        let Some(el) = self.canvas.get(id) else {
            return false;
        };
        self.drag = DragState::press(id, (el.x, el.y), (sx, sy));
        true
    }

    /// Speculative position of the dragged element, once dragging.
    pub fn pointer_move(&mut self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        self.drag.pointer_move((sx, sy), self.zoom, &self.show_grid)
    }

    /// Release: commits the snapped position in one update.
    pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Option<DragCommit> {
        let commit = self.drag.release((sx, sy), self.zoom, self.grid_size)?;
        let el = self.canvas.get_mut(&commit.id)?;
        el.x = commit.x;
        el.y = commit.y;
        self.touch();
        log::debug!("moved '{}' to ({}, {})", commit.id, commit.x, commit.y);
        Some(commit)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn drag_preview(&self) -> Option<(&str, f64, f64)> {
        self.drag.preview()
    }

    /// Hydrated editor renderer carrying the current selection.
    pub fn renderer(&self) -> Renderer {
        let mut renderer = Renderer::new(RenderMode::Editor).hydrate();
        renderer.set_selection(self.canvas.selected_element_ids.iter().cloned());
        renderer
    }

    pub fn render(&self) -> RenderOutput {
        self.renderer().render_canvas(&self.canvas)
    }

    /// Save through `sink`. On failure local edits are kept and the state
    /// becomes `Failed`; nothing is retried.
    pub fn save(&mut self, sink: &dyn PageSink) -> Result<()> {
        self.save_state = SaveState::Saving;
        let snapshot = self.canvas.without_selection();
        match sink.save_canvas(&self.page_id, &snapshot) {
            Ok(()) => {
                log::info!("saved page '{}' ({} elements)", self.page_id, snapshot.len());
                self.save_state = SaveState::Saved;
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                log::warn!("saving page '{}' failed: {}", self.page_id, err);
                self.save_state = SaveState::Failed(err.to_string());
                Err(err)
            }
        }
    }
}
