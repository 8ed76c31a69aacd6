//! Isolated render trees.
//!
//! Every component owns one [`RenderRoot`]. Nothing outside the component
//! touches it except through declared slots, which are the only insertion
//! points extension modules may use.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A node of a component's render tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            attrs: BTreeMap::new(),
            hidden: false,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add or remove a class.
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        let present = self.has_class(class);
        if on && !present {
            self.classes.push(class.to_string());
        } else if !on && present {
            self.classes.retain(|c| c != class);
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    fn remove_descendant(&mut self, id: &str) -> Option<Element> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|child| child.id.as_deref() == Some(id))
        {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_descendant(id))
    }

    /// Depth-first collection of every element matching `pred`.
    pub fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for child in &self.children {
            child.collect(pred, out);
        }
    }
}

/// Whether an injection inserted a node or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Inserted,
    AlreadyPresent,
}

/// Where in the slot an injected node goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    First,
    Last,
}

/// The isolated render tree of one component.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRoot {
    host: String,
    root: Element,
    slots: BTreeMap<String, String>,
    injected: BTreeSet<String>,
}

impl RenderRoot {
    pub fn new(host: impl Into<String>, root: Element) -> Self {
        Self {
            host: host.into(),
            root,
            slots: BTreeMap::new(),
            injected: BTreeSet::new(),
        }
    }

    /// Declare `element_id` as the insertion point named `slot`.
    pub fn with_slot(mut self, slot: impl Into<String>, element_id: impl Into<String>) -> Self {
        self.slots.insert(slot.into(), element_id.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.root.find(id).is_some()
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.root.find(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_mut(id)
    }

    /// Set the text of `id`; returns `false` if absent.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.root.find_mut(id) {
            Some(el) => {
                el.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.element(id).map(|el| el.text.as_str())
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        match self.root.find_mut(id) {
            Some(el) => {
                el.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn is_hidden(&self, id: &str) -> Option<bool> {
        self.element(id).map(|el| el.hidden)
    }

    pub fn set_attr(&mut self, id: &str, key: &str, value: impl Into<String>) -> bool {
        match self.root.find_mut(id) {
            Some(el) => {
                el.attrs.insert(key.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Replace the children of `id`.
    pub fn replace_children(&mut self, id: &str, children: Vec<Element>) -> bool {
        match self.root.find_mut(id) {
            Some(el) => {
                el.children = children;
                true
            }
            None => false,
        }
    }

    /// Remove the element `id` (not the root itself).
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.injected.remove(id);
        self.root.remove_descendant(id)
    }

    /// Insert `element` into `slot` unless an element with its id exists.
    pub fn inject(&mut self, slot: &str, element: Element, placement: Placement) -> Result<Injection> {
        let id = element.id.clone().ok_or(Error::AnonymousElement)?;
        if self.contains(&id) {
            return Ok(Injection::AlreadyPresent);
        }
        let target = self.slots.get(slot).cloned().ok_or_else(|| Error::MissingSlot {
            component: self.host.clone(),
            slot: slot.to_string(),
        })?;
        let parent = self.root.find_mut(&target).ok_or_else(|| Error::MissingElement {
            component: self.host.clone(),
            element: target.clone(),
        })?;
        match placement {
            Placement::First => parent.children.insert(0, element),
            Placement::Last => parent.children.push(element),
        }
        self.injected.insert(id);
        Ok(Injection::Inserted)
    }

    /// Whether `id` was placed by an injection.
    pub fn is_injected(&self, id: &str) -> bool {
        self.injected.contains(id)
    }

    /// Mutate an injected element. Elements the component created itself
    /// are out of reach.
    pub fn update_injected(&mut self, id: &str, f: impl FnOnce(&mut Element)) -> bool {
        if !self.injected.contains(id) {
            return false;
        }
        match self.root.find_mut(id) {
            Some(el) => {
                f(el);
                true
            }
            None => false,
        }
    }

    /// Count elements whose id equals `id`.
    pub fn count_id(&self, id: &str) -> usize {
        let mut found = Vec::new();
        self.root.collect(&|el| el.id.as_deref() == Some(id), &mut found);
        found.len()
    }
}
