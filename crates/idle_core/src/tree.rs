//! Arena-owned component tree.
//!
//! Every battle entity (the map, each actor, each projectile) is a node in a
//! [`ComponentTree`]. The arena owns all nodes; parent and child links are
//! plain [`NodeId`]s, so there are no ownership cycles and dropping the arena
//! releases everything at once.
//!
//! # Invariant
//!
//! A node appears in at most one parent's `children` list, and that parent is
//! exactly the node's own `parent`. [`ComponentTree::set_parent`] maintains
//! this atomically. Cycles are not detected; callers must not create them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::{CombatError, Result};

/// Unique identifier for component nodes within one battle.
pub type NodeId = u64;

/// Discriminant of a node's payload, used for filtered child views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// The battle map (tree root).
    Map,
    /// A combatant.
    Actor,
    /// An in-flight projectile.
    Projectile,
}

/// Payload carried by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    /// The battle map.
    Map,
    /// A combatant with stats and state.
    Actor(Actor),
    /// A projectile travelling from `source` to `target`.
    Projectile {
        /// Firing actor.
        source: NodeId,
        /// Intended target.
        target: NodeId,
    },
}

impl NodeData {
    /// Get the kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Map => ComponentKind::Map,
            Self::Actor(_) => ComponentKind::Actor,
            Self::Projectile { .. } => ComponentKind::Projectile,
        }
    }
}

/// A node in the component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    /// Profile key used to resolve this node's behavior.
    pub profile_key: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Node payload.
    pub data: NodeData,
}

impl Node {
    /// Node identifier.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Current parent, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attach order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Kind of this node's payload.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    /// Actor payload, if this node is an actor.
    #[must_use]
    pub const fn as_actor(&self) -> Option<&Actor> {
        match &self.data {
            NodeData::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    /// Mutable actor payload, if this node is an actor.
    pub fn as_actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.data {
            NodeData::Actor(actor) => Some(actor),
            _ => None,
        }
    }
}

/// Arena storage for all component nodes of one battle.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic
/// iteration via sorted keys when hashing or snapshotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentTree {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a detached node and return its ID.
    pub fn insert(&mut self, profile_key: i32, data: NodeData) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                profile_key,
                parent: None,
                children: Vec::new(),
                data,
            },
        );
        id
    }

    /// Get a node by ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Check if a node exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::parent)
    }

    /// Children of a node, in attach order. Empty for unknown nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |node| node.children())
    }

    /// Children of `id` whose payload is of `kind`, in attach order.
    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.nodes.get(child).is_some_and(|n| n.kind() == kind))
    }

    /// Move `child` under `new_parent`, or detach it when `None`.
    ///
    /// Removes the child from its current parent's list, reassigns the
    /// parent link, and appends to the new parent's list unless already
    /// present there.
    ///
    /// # Errors
    /// Returns [`CombatError::NodeNotFound`] if either node does not exist.
    /// The tree is left unchanged in that case.
    pub fn set_parent(&mut self, child: NodeId, new_parent: Option<NodeId>) -> Result<()> {
        if !self.nodes.contains_key(&child) {
            return Err(CombatError::NodeNotFound(child));
        }
        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(&parent) {
                return Err(CombatError::NodeNotFound(parent));
            }
        }

        let old_parent = self.nodes.get(&child).and_then(Node::parent);
        if let Some(old) = old_parent {
            if let Some(old_node) = self.nodes.get_mut(&old) {
                old_node.children.retain(|&c| c != child);
            }
        }

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = new_parent;
        }

        if let Some(parent) = new_parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                if !parent_node.children.contains(&child) {
                    parent_node.children.push(child);
                }
            }
        }

        Ok(())
    }

    /// Detach `child` from its parent.
    ///
    /// # Errors
    /// Returns [`CombatError::NodeNotFound`] if the node does not exist.
    pub fn remove_parent(&mut self, child: NodeId) -> Result<()> {
        self.set_parent(child, None)
    }

    /// Remove a node, detaching it from its parent and orphaning its children.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let _ = self.remove_parent(id);
        let node = self.nodes.remove(&id)?;
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
        }
        Some(node)
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Get sorted node IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all nodes (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }
}
