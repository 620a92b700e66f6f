// ── Registration adapter ──
//
// The host platform owns entity lifecycle and notification UI. The core
// only talks to it through these sinks, and hands out `EntityHandle`s for
// per-entity reads and commands.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use tecoapi_api::TecoClient;

use crate::entity::{EntityDescriptor, EntityKind};
use crate::error::CoreError;
use crate::tree::{NodeId, ObjectTree};

/// Receives entity registrations and groupings from platform setup.
pub trait EntitySink: Send + Sync {
    /// Called once per platform with every entity it exposes.
    fn register(&self, entities: &[EntityDescriptor]);

    /// Called for each declared root that produced more than one entity.
    fn create_group(&self, name: &str, entity_ids: &[String]);
}

/// Receives user-facing messages (service results).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Group recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGroup {
    pub name: String,
    pub entity_ids: Vec<String>,
}

/// In-memory sink that records everything it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    entities: Mutex<Vec<EntityDescriptor>>,
    groups: Mutex<Vec<RecordedGroup>>,
    notifications: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> Vec<EntityDescriptor> {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn unique_ids(&self) -> Vec<String> {
        self.entities().into_iter().map(|e| e.unique_id).collect()
    }

    pub fn groups(&self) -> Vec<RecordedGroup> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EntitySink for MemorySink {
    fn register(&self, entities: &[EntityDescriptor]) {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(entities);
    }

    fn create_group(&self, name: &str, entity_ids: &[String]) {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedGroup {
                name: name.to_owned(),
                entity_ids: entity_ids.to_vec(),
            });
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, title: &str, message: &str) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_owned(), message.to_owned()));
    }
}

/// Register a freshly built tree with `sink`.
///
/// `per_root` holds, for every declared root in order, the nodes its build
/// produced; roots with more than one entity also get a group named after
/// the root.
pub(crate) fn register_tree(
    tree: &ObjectTree,
    per_root: &[(NodeId, Vec<NodeId>)],
    sink: &dyn EntitySink,
) -> Vec<EntityDescriptor> {
    let descriptors: Vec<EntityDescriptor> = tree
        .registered()
        .iter()
        .filter_map(|&id| tree.descriptor(id))
        .collect();
    sink.register(&descriptors);

    for (root, members) in per_root {
        if members.len() < 2 {
            continue;
        }
        let Some(node) = tree.node(*root) else {
            continue;
        };
        let ids: Vec<String> = members
            .iter()
            .filter_map(|&id| tree.descriptor(id))
            .map(|d| d.unique_id)
            .collect();
        sink.create_group(node.name(), &ids);
    }

    descriptors
}

/// A registered entity: one node of a tree plus the client it writes
/// through.
#[derive(Clone)]
pub struct EntityHandle {
    tree: Arc<ObjectTree>,
    node: NodeId,
    client: TecoClient,
}

impl std::fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandle")
            .field("kind", &self.tree.kind())
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl EntityHandle {
    pub(crate) fn new(tree: Arc<ObjectTree>, node: NodeId, client: TecoClient) -> Self {
        Self { tree, node, client }
    }

    pub fn kind(&self) -> EntityKind {
        self.tree.kind()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tree(&self) -> &Arc<ObjectTree> {
        &self.tree
    }

    pub fn descriptor(&self) -> Option<EntityDescriptor> {
        self.tree.descriptor(self.node)
    }

    pub fn state(&self) -> Option<Value> {
        self.tree.state(self.node)
    }

    pub fn is_on(&self) -> bool {
        self.tree.is_on(self.node)
    }

    pub async fn turn_on(&self) -> Result<bool, CoreError> {
        self.tree.set(self.node, true, &self.client).await
    }

    pub async fn turn_off(&self) -> Result<bool, CoreError> {
        self.tree.set(self.node, false, &self.client).await
    }

    /// Poll the root this entity belongs to.
    pub async fn refresh(&self) -> bool {
        match self.tree.root_of(self.node) {
            Some(root) => self.tree.refresh_root(root, &self.client).await,
            None => false,
        }
    }
}
