//! Parent/child relation between items.
//!
//! # Responsibility
//! - Own items in an arena addressed by stable `ItemId` handles.
//! - Maintain parent links and ordered child lists together.
//!
//! # Invariants
//! - The parent graph is acyclic; an item is never its own ancestor.
//! - `children(p)` contains `c` exactly when `parent(c) == Some(p)`.
//! - A rejected `set_parent` leaves every parent and child list untouched.

use crate::item::Item;
use crate::render::item_to_html;
use log::debug;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable handle of an item inside one [`Outline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(usize);

impl ItemId {
    /// Arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Result type for outline operations.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Errors from outline relation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// Parent assignment would make `item` its own ancestor.
    CircularRelationship { item: ItemId, parent: ItemId },
    /// Handle does not belong to this outline.
    ItemNotFound(ItemId),
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircularRelationship { item, parent } => write!(
                f,
                "parent change would create cycle: {item} under parent {parent}"
            ),
            Self::ItemNotFound(id) => write!(f, "outline item not found: {id}"),
        }
    }
}

impl Error for OutlineError {}

#[derive(Debug, Clone)]
struct Node {
    item: Item,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
}

/// Arena of items forming a forest.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    nodes: Vec<Node>,
}

impl Outline {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds an item, optionally attached as last child of `parent`.
    ///
    /// # Errors
    /// - `ItemNotFound` when `parent` is unknown; nothing is added.
    pub fn insert(&mut self, item: Item, parent: Option<ItemId>) -> OutlineResult<ItemId> {
        if let Some(parent) = parent {
            self.ensure_exists(parent)?;
        }
        let id = self.insert_root(item);
        self.set_parent(id, parent)?;
        Ok(id)
    }

    /// Adds an item without a parent.
    pub fn insert_root(&mut self, item: Item) -> ItemId {
        let id = ItemId(self.nodes.len());
        self.nodes.push(Node {
            item,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Handles of every item in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (0..self.nodes.len()).map(ItemId)
    }

    /// Items without a parent, in insertion order.
    pub fn roots(&self) -> Vec<ItemId> {
        self.ids()
            .filter(|id| self.nodes[id.0].parent.is_none())
            .collect()
    }

    pub fn item(&self, id: ItemId) -> OutlineResult<&Item> {
        self.node(id).map(|node| &node.item)
    }

    pub fn item_mut(&mut self, id: ItemId) -> OutlineResult<&mut Item> {
        self.nodes
            .get_mut(id.0)
            .map(|node| &mut node.item)
            .ok_or(OutlineError::ItemNotFound(id))
    }

    pub fn parent(&self, id: ItemId) -> OutlineResult<Option<ItemId>> {
        self.node(id).map(|node| node.parent)
    }

    /// Children of `id` in attachment order.
    pub fn children(&self, id: ItemId) -> OutlineResult<&[ItemId]> {
        self.node(id).map(|node| node.children.as_slice())
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ItemId) -> OutlineResult<Vec<ItemId>> {
        let mut ancestors = Vec::new();
        let mut cursor = self.node(id)?.parent;
        while let Some(current) = cursor {
            ancestors.push(current);
            cursor = self.node(current)?.parent;
        }
        Ok(ancestors)
    }

    /// 1 for roots, otherwise 1 + depth of the parent.
    pub fn depth(&self, id: ItemId) -> OutlineResult<usize> {
        Ok(self.ancestors(id)?.len() + 1)
    }

    /// Reparents `id` under `new_parent`, or detaches it with `None`.
    ///
    /// # Errors
    /// - `ItemNotFound` for unknown handles.
    /// - `CircularRelationship` when `id` is `new_parent` or one of its
    ///   ancestors; nothing changes.
    pub fn set_parent(&mut self, id: ItemId, new_parent: Option<ItemId>) -> OutlineResult<()> {
        let current = self.node(id)?.parent;
        if let Some(parent) = new_parent {
            self.ensure_exists(parent)?;
        }
        if current == new_parent {
            return Ok(());
        }

        if let Some(parent) = new_parent {
            if self.would_create_cycle(id, parent) {
                debug!(
                    "event=set_parent module=outline status=rejected item={} parent={}",
                    id, parent
                );
                return Err(OutlineError::CircularRelationship { item: id, parent });
            }
        }

        if let Some(old) = current {
            self.nodes[old.0].children.retain(|child| *child != id);
        }
        if let Some(parent) = new_parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes[id.0].parent = new_parent;
        debug!(
            "event=set_parent module=outline status=ok item={} parent={}",
            id,
            new_parent.map_or_else(|| "none".to_string(), |parent| parent.to_string())
        );
        Ok(())
    }

    /// Detaches `id` from its parent.
    pub fn detach(&mut self, id: ItemId) -> OutlineResult<()> {
        self.set_parent(id, None)
    }

    /// Renders `id` as HTML, using its outline depth for headings.
    pub fn to_html(&self, id: ItemId) -> OutlineResult<String> {
        Ok(item_to_html(self.item(id)?, self.depth(id)?))
    }

    fn node(&self, id: ItemId) -> OutlineResult<&Node> {
        self.nodes.get(id.0).ok_or(OutlineError::ItemNotFound(id))
    }

    fn ensure_exists(&self, id: ItemId) -> OutlineResult<()> {
        self.node(id).map(|_| ())
    }

    fn would_create_cycle(&self, id: ItemId, candidate_parent: ItemId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent);
        while let Some(current) = cursor {
            if current == id || !visited.insert(current) {
                return true;
            }
            cursor = self.nodes.get(current.0).and_then(|node| node.parent);
        }
        false
    }
}
