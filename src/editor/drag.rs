//! Drag state machine: `Idle -> Pending -> Dragging -> Idle`.
//!
//! Pointer coordinates are screen pixels; element positions are canvas
//! pixels. A drag only starts once the pointer has moved past
//! [`DRAG_THRESHOLD`], and nothing touches the canvas until release.

use std::cell::Cell;
use std::rc::Rc;

/// Screen-space distance the pointer must travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Round `value` to the nearest multiple of `cell`. A non-positive cell
/// disables snapping.
pub fn snap_to_grid(value: f64, cell: f64) -> f64 {
    if cell > 0.0 && cell.is_finite() {
        (value / cell).round() * cell
    } else {
        value
    }
}

/// Shows the grid for as long as it lives, then puts the previous
/// visibility back. Held by the dragging state so every way out of a drag
/// (commit, cancel, or the session going away) restores it.
#[derive(Debug)]
pub struct GridGuard {
    flag: Rc<Cell<bool>>,
    previous: bool,
}

impl GridGuard {
    pub fn show(flag: &Rc<Cell<bool>>) -> Self {
        let previous = flag.replace(true);
        Self { flag: Rc::clone(flag), previous }
    }
}

impl Drop for GridGuard {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

#[derive(Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on an element but hasn't moved far enough yet.
    Pending {
        id: String,
        origin: (f64, f64),
        pointer: (f64, f64),
    },
    Dragging {
        id: String,
        origin: (f64, f64),
        pointer: (f64, f64),
        /// Unsnapped position under the pointer.
        current: (f64, f64),
        _grid: GridGuard,
    },
}

/// A release that moved an element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCommit {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

fn scaled(origin: (f64, f64), from: (f64, f64), to: (f64, f64), zoom: f64) -> (f64, f64) {
    (origin.0 + (to.0 - from.0) / zoom, origin.1 + (to.1 - from.1) / zoom)
}

impl DragState {
    pub fn press(id: impl Into<String>, origin: (f64, f64), pointer: (f64, f64)) -> Self {
        DragState::Pending { id: id.into(), origin, pointer }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Element id and unsnapped position while dragging.
    pub fn preview(&self) -> Option<(&str, f64, f64)> {
        match self {
            DragState::Dragging { id, current, .. } => Some((id.as_str(), current.0, current.1)),
            _ => None,
        }
    }

    /// Pointer moved. Crossing the threshold starts the drag and shows the
    /// grid through `grid`. Returns the speculative position while dragging.
    pub fn pointer_move(&mut self, to: (f64, f64), zoom: f64, grid: &Rc<Cell<bool>>) -> Option<(f64, f64)> {
        match std::mem::take(self) {
            DragState::Pending { id, origin, pointer } => {
                let (dx, dy) = (to.0 - pointer.0, to.1 - pointer.1);
                if dx.hypot(dy) <= DRAG_THRESHOLD {
                    *self = DragState::Pending { id, origin, pointer };
                    return None;
                }
                log::debug!("drag started on '{}'", id);
                let current = scaled(origin, pointer, to, zoom);
                *self = DragState::Dragging { id, origin, pointer, current, _grid: GridGuard::show(grid) };
                Some(current)
            }
            DragState::Dragging { id, origin, pointer, _grid, .. } => {
                let current = scaled(origin, pointer, to, zoom);
                *self = DragState::Dragging { id, origin, pointer, current, _grid };
                Some(current)
            }
            DragState::Idle => None,
        }
    }

    /// Pointer released. A drag yields the snapped position to commit; a
    /// press that never crossed the threshold yields nothing.
    pub fn release(&mut self, at: (f64, f64), zoom: f64, cell: f64) -> Option<DragCommit> {
        match std::mem::take(self) {
            DragState::Dragging { id, origin, pointer, .. } => {
                let (x, y) = scaled(origin, pointer, at, zoom);
                Some(DragCommit { id, x: snap_to_grid(x, cell), y: snap_to_grid(y, cell) })
            }
            _ => None,
        }
    }

    /// Abandon the gesture without moving anything.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_rounds_to_nearest_cell() {
        assert_eq!(snap_to_grid(21.5, 10.0), 20.0);
        assert_eq!(snap_to_grid(6.5, 10.0), 10.0);
        assert_eq!(snap_to_grid(-4.0, 10.0), -0.0);
        assert_eq!(snap_to_grid(7.3, 0.0), 7.3);
    }

    #[test]
    fn guard_restores_previous_visibility() {
        let flag = Rc::new(Cell::new(false));
        {
            let _g = GridGuard::show(&flag);
            assert!(flag.get());
        }
        assert!(!flag.get());

        flag.set(true);
        drop(GridGuard::show(&flag));
        assert!(flag.get());
    }

    #[test]
    fn small_moves_stay_pending() {
        let flag = Rc::new(Cell::new(false));
        let mut drag = DragState::press("a", (0.0, 0.0), (50.0, 50.0));
        assert_eq!(drag.pointer_move((52.0, 51.0), 1.0, &flag), None);
        assert!(!drag.is_dragging());
        assert!(!flag.get());
        assert_eq!(drag.release((52.0, 51.0), 1.0, 10.0), None);
        assert!(drag.is_idle());
    }

    #[test]
    fn commit_scales_by_zoom_then_snaps() {
        let flag = Rc::new(Cell::new(false));
        let mut drag = DragState::press("a", (10.0, 10.0), (100.0, 100.0));
        assert_eq!(drag.pointer_move((123.0, 93.0), 2.0, &flag), Some((21.5, 6.5)));
        assert!(flag.get());
        let commit = drag.release((123.0, 93.0), 2.0, 10.0).unwrap();
        assert_eq!((commit.x, commit.y), (20.0, 10.0));
        assert!(!flag.get());
        assert!(drag.is_idle());
    }

    #[test]
    fn cancel_restores_grid() {
        let flag = Rc::new(Cell::new(false));
        let mut drag = DragState::press("a", (0.0, 0.0), (0.0, 0.0));
        drag.pointer_move((40.0, 0.0), 1.0, &flag);
        assert!(flag.get());
        drag.cancel();
        assert!(!flag.get());
    }
}
