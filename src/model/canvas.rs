//! The canvas: a flat, ordered element store plus dimensions.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Element, Hierarchy};
use crate::{Error, Result};

pub const DEFAULT_CANVAS_WIDTH: f64 = 1200.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 800.0;

fn default_width() -> f64 {
    DEFAULT_CANVAS_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_CANVAS_HEIGHT
}

/// One page's visual content.
///
/// `elements` is the authoritative flat store. Containers reference their
/// children by id and children point back through `parentId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    #[serde(default, deserialize_with = "super::lenient::elements")]
    pub elements: Vec<Element>,
    #[serde(default = "default_width", deserialize_with = "super::lenient::f64_or_zero")]
    pub width: f64,
    #[serde(default = "default_height", deserialize_with = "super::lenient::f64_or_zero")]
    pub height: f64,
    /// Editor-only. Stripped before a canvas is persisted or published.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_element_ids: BTreeSet<String>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// A consistency problem found by [`Canvas::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasIssue {
    EmptyId { index: usize },
    DuplicateId { id: String },
    MissingChild { container: String, child: String },
    ChildNotBackLinked { container: String, child: String },
    ParentNotContainer { child: String, parent: String },
    ParentMissing { child: String, parent: String },
    NotListedByParent { child: String, parent: String },
}

impl std::fmt::Display for CanvasIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasIssue::EmptyId { index } => write!(f, "element #{} has an empty id", index),
            CanvasIssue::DuplicateId { id } => write!(f, "duplicate element id '{}'", id),
            CanvasIssue::MissingChild { container, child } => {
                write!(f, "container '{}' lists missing child '{}'", container, child)
            }
            CanvasIssue::ChildNotBackLinked { container, child } => write!(
                f,
                "container '{}' lists '{}' but its parentId points elsewhere",
                container, child
            ),
            CanvasIssue::ParentNotContainer { child, parent } => {
                write!(f, "'{}' has parent '{}' which is not a container", child, parent)
            }
            CanvasIssue::ParentMissing { child, parent } => {
                write!(f, "'{}' has missing parent '{}'", child, parent)
            }
            CanvasIssue::NotListedByParent { child, parent } => {
                write!(f, "'{}' names parent '{}' which doesn't list it", child, parent)
            }
        }
    }
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
            selected_element_ids: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Append `element`. Ids must stay unique.
    pub fn push(&mut self, element: Element) -> Result<()> {
        if element.id.is_empty() {
            return Err(Error::invalid("id", "element id must not be empty"));
        }
        if self.get(&element.id).is_some() {
            return Err(Error::Conflict(format!("element id '{}' already exists", element.id)));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Put `child` inside `container` at the end of its child list, detaching
    /// it from any previous container first. Both links are updated together.
    pub fn add_to_container(&mut self, child: &str, container: &str) -> Result<()> {
        if child == container {
            return Err(Error::invalid("parentId", "an element cannot contain itself"));
        }
        match self.get(container) {
            None => return Err(Error::not_found("element", container)),
            Some(c) if !c.is_container() => {
                return Err(Error::invalid("parentId", format!("'{}' is not a container", container)))
            }
            Some(_) => {}
        }
        if self.get(child).is_none() {
            return Err(Error::not_found("element", child));
        }
        if self.is_ancestor(child, container) {
            return Err(Error::invalid("parentId", "moving a container into its own descendant"));
        }

        self.detach(child);
        if let Some(c) = self.get_mut(container).and_then(Element::as_container_mut) {
            c.children.push(child.to_string());
        }
        if let Some(el) = self.get_mut(child) {
            el.parent_id = Some(container.to_string());
        }
        Ok(())
    }

    /// Make `child` top-level. Returns the id of the container it left.
    pub fn detach(&mut self, child: &str) -> Option<String> {
        let parent = self.get_mut(child)?.parent_id.take();
        for el in &mut self.elements {
            if let Some(c) = el.as_container_mut() {
                c.children.retain(|id| id != child);
            }
        }
        parent
    }

    /// Remove an element. Its direct children become top-level.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        let idx = self.position(id)?;
        self.detach(id);
        let removed = self.elements.remove(idx);
        for el in &mut self.elements {
            if el.parent_id.as_deref() == Some(id) {
                el.parent_id = None;
            }
        }
        self.selected_element_ids.remove(id);
        Some(removed)
    }

    /// `true` when `ancestor` is somewhere above `id` in the parent chain.
    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut cur = self.get(id).and_then(|e| e.parent_id.clone());
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            if !seen.insert(p.clone()) {
                return false;
            }
            cur = self.get(&p).and_then(|e| e.parent_id.clone());
        }
        false
    }

    /// Effective parent/child index used for nested views.
    pub fn hierarchy(&self) -> Hierarchy {
        Hierarchy::build(&self.elements)
    }

    /// Copy without editor-only state, as it is persisted.
    pub fn without_selection(&self) -> Canvas {
        Canvas {
            selected_element_ids: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Report every id and parent/child consistency problem.
    pub fn validate(&self) -> Vec<CanvasIssue> {
        let mut issues = Vec::new();
        let mut by_id: HashMap<&str, &Element> = HashMap::new();
        for (index, el) in self.elements.iter().enumerate() {
            if el.id.is_empty() {
                issues.push(CanvasIssue::EmptyId { index });
                continue;
            }
            if by_id.insert(el.id.as_str(), el).is_some() {
                issues.push(CanvasIssue::DuplicateId { id: el.id.clone() });
            }
        }

        for el in &self.elements {
            if let Some(container) = el.as_container() {
                for child in &container.children {
                    match by_id.get(child.as_str()) {
                        None => issues.push(CanvasIssue::MissingChild {
                            container: el.id.clone(),
                            child: child.clone(),
                        }),
                        Some(c) if c.parent_id.as_deref() != Some(el.id.as_str()) => {
                            issues.push(CanvasIssue::ChildNotBackLinked {
                                container: el.id.clone(),
                                child: child.clone(),
                            })
                        }
                        Some(_) => {}
                    }
                }
            }

            if let Some(parent) = &el.parent_id {
                match by_id.get(parent.as_str()).map(|p| p.as_container()) {
                    None => issues.push(CanvasIssue::ParentMissing {
                        child: el.id.clone(),
                        parent: parent.clone(),
                    }),
                    Some(None) => issues.push(CanvasIssue::ParentNotContainer {
                        child: el.id.clone(),
                        parent: parent.clone(),
                    }),
                    Some(Some(c)) if !c.children.contains(&el.id) => {
                        issues.push(CanvasIssue::NotListedByParent {
                            child: el.id.clone(),
                            parent: parent.clone(),
                        })
                    }
                    Some(Some(_)) => {}
                }
            }
        }
        issues
    }
}
