//! Box placement: absolute positions for top-level elements, a single-pass
//! flex flow for elements inside containers.

use serde::{Deserialize, Serialize};

use crate::extract::StyleBag;
use crate::flatten::FlatElement;
use crate::model::{AlignItems, FlexDirection, FlexWrap, Hierarchy, JustifyContent, Spacing};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Shrink by `pad` on each side; never goes negative.
    pub fn inset(&self, pad: &Spacing) -> Rect {
        Rect {
            x: self.x + pad.left,
            y: self.y + pad.top,
            width: (self.width - pad.horizontal()).max(0.0),
            height: (self.height - pad.vertical()).max(0.0),
        }
    }

    /// Grow by `amount` on each side.
    pub fn outset(&self, amount: f64) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Flex settings read back from a container's style bag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlexConfig {
    pub direction: FlexDirection,
    pub justify: JustifyContent,
    pub align: AlignItems,
    pub wrap: FlexWrap,
    pub gap: f64,
}

impl FlexConfig {
    pub fn from_style(style: &StyleBag) -> Self {
        Self {
            direction: style.str("flexDirection").and_then(FlexDirection::parse).unwrap_or_default(),
            justify: style.str("justifyContent").and_then(JustifyContent::parse).unwrap_or_default(),
            align: style.str("alignItems").and_then(AlignItems::parse).unwrap_or_default(),
            wrap: style.str("flexWrap").and_then(FlexWrap::parse).unwrap_or_default(),
            gap: style.f64("gap").unwrap_or(0.0).max(0.0),
        }
    }
}

// (leading offset, distance between item starts minus item size)
fn justify_offsets(justify: JustifyContent, free: f64, count: usize, gap: f64) -> (f64, f64) {
    let n = count as f64;
    match justify {
        JustifyContent::FlexStart => (0.0, gap),
        JustifyContent::FlexEnd => (free, gap),
        JustifyContent::Center => (free / 2.0, gap),
        JustifyContent::SpaceBetween if count > 1 && free > 0.0 => (0.0, gap + free / (n - 1.0)),
        JustifyContent::SpaceBetween => (0.0, gap),
        JustifyContent::SpaceAround if free > 0.0 => (free / n / 2.0, gap + free / n),
        JustifyContent::SpaceEvenly if free > 0.0 => (free / (n + 1.0), gap + free / (n + 1.0)),
        JustifyContent::SpaceAround | JustifyContent::SpaceEvenly => (free / 2.0, gap),
    }
}

/// Top-left corner of each item, in the coordinate space of `content`.
///
/// Sizes are already concrete, so `stretch` places items like `flex-start`
/// without resizing them.
pub fn flex_positions(content: Rect, config: &FlexConfig, sizes: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let row = config.direction.is_row();
    let (main_len, cross_len) = if row {
        (content.width, content.height)
    } else {
        (content.height, content.width)
    };
    let main_of = |s: (f64, f64)| if row { s.0 } else { s.1 };
    let cross_of = |s: (f64, f64)| if row { s.1 } else { s.0 };
    let wraps = config.wrap == FlexWrap::Wrap;

    let mut lines: Vec<Vec<usize>> = Vec::new();
    let mut line: Vec<usize> = Vec::new();
    let mut line_main = 0.0;
    for (i, size) in sizes.iter().enumerate() {
        let m = main_of(*size);
        let needed = if line.is_empty() { m } else { line_main + config.gap + m };
        if wraps && !line.is_empty() && needed > main_len {
            lines.push(std::mem::take(&mut line));
            line_main = m;
        } else {
            line_main = needed;
        }
        line.push(i);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    let mut out = vec![(content.x, content.y); sizes.len()];
    let mut cross_cursor = 0.0;
    for line in &lines {
        let count = line.len();
        let used: f64 = line.iter().map(|&i| main_of(sizes[i])).sum::<f64>()
            + config.gap * count.saturating_sub(1) as f64;
        let (start, step) = justify_offsets(config.justify, main_len - used, count, config.gap);
        let line_cross = if wraps {
            line.iter().map(|&i| cross_of(sizes[i])).fold(0.0, f64::max)
        } else {
            cross_len
        };

        let mut main_cursor = start;
        for &i in line {
            let m = main_of(sizes[i]);
            let c = cross_of(sizes[i]);
            let cross_offset = match config.align {
                AlignItems::FlexStart | AlignItems::Stretch => 0.0,
                AlignItems::Center => (line_cross - c) / 2.0,
                AlignItems::FlexEnd => line_cross - c,
            };
            let main_pos = if config.direction.is_reverse() {
                main_len - main_cursor - m
            } else {
                main_cursor
            };
            let cross_pos = cross_cursor + cross_offset;
            out[i] = if row {
                (content.x + main_pos, content.y + cross_pos)
            } else {
                (content.x + cross_pos, content.y + main_pos)
            };
            main_cursor += m + step;
        }
        cross_cursor += line_cross + config.gap;
    }
    out
}

/// Final canvas-space rect of every element, indexed like `elements`.
pub fn layout_elements(elements: &[FlatElement], hierarchy: &Hierarchy) -> Vec<Rect> {
    let mut rects: Vec<Rect> = elements
        .iter()
        .map(|e| Rect::new(e.x, e.y, e.width, e.height))
        .collect();

    for idx in hierarchy.preorder() {
        let kids = hierarchy.children_of(idx);
        if kids.is_empty() {
            continue;
        }
        let container = &elements[idx];
        let content = rects[idx].inset(&container.style.padding());
        let config = FlexConfig::from_style(&container.style);
        let sizes: Vec<(f64, f64)> = kids.iter().map(|&k| (rects[k].width, rects[k].height)).collect();
        for (&k, (x, y)) in kids.iter().zip(flex_positions(content, &config, &sizes)) {
            rects[k].x = x;
            rects[k].y = y;
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(justify: JustifyContent) -> FlexConfig {
        FlexConfig { direction: FlexDirection::Row, justify, gap: 10.0, ..Default::default() }
    }

    #[test]
    fn space_between_fills_the_line() {
        let content = Rect::new(0.0, 0.0, 300.0, 100.0);
        let sizes = [(50.0, 20.0); 3];
        let pos = flex_positions(content, &row(JustifyContent::SpaceBetween), &sizes);
        assert_eq!(pos, vec![(0.0, 0.0), (125.0, 0.0), (250.0, 0.0)]);
    }

    #[test]
    fn center_and_end() {
        let content = Rect::new(10.0, 10.0, 200.0, 100.0);
        let sizes = [(40.0, 20.0), (40.0, 20.0)];
        // used = 90, free = 110
        let pos = flex_positions(content, &row(JustifyContent::Center), &sizes);
        assert_eq!(pos[0], (65.0, 10.0));
        let pos = flex_positions(content, &row(JustifyContent::FlexEnd), &sizes);
        assert_eq!(pos[1], (170.0, 10.0));
    }

    #[test]
    fn column_with_cross_alignment() {
        let content = Rect::new(0.0, 0.0, 100.0, 300.0);
        let config = FlexConfig {
            direction: FlexDirection::Column,
            align: AlignItems::Center,
            gap: 5.0,
            ..Default::default()
        };
        let pos = flex_positions(content, &config, &[(20.0, 30.0), (60.0, 30.0)]);
        assert_eq!(pos, vec![(40.0, 0.0), (20.0, 35.0)]);
    }

    #[test]
    fn reverse_mirrors_along_main_axis() {
        let content = Rect::new(0.0, 0.0, 100.0, 50.0);
        let config = FlexConfig { direction: FlexDirection::RowReverse, ..Default::default() };
        let pos = flex_positions(content, &config, &[(30.0, 10.0), (20.0, 10.0)]);
        assert_eq!(pos, vec![(70.0, 0.0), (50.0, 0.0)]);
    }

    #[test]
    fn wrap_breaks_lines() {
        let content = Rect::new(0.0, 0.0, 100.0, 200.0);
        let config = FlexConfig { wrap: FlexWrap::Wrap, gap: 10.0, ..Default::default() };
        let pos = flex_positions(content, &config, &[(60.0, 20.0), (60.0, 30.0), (30.0, 10.0)]);
        assert_eq!(pos, vec![(0.0, 0.0), (0.0, 30.0), (70.0, 30.0)]);
    }
}
