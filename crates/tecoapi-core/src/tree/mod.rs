// ── Object tree ──
//
// Arena of nodes materialized from the device's JSON object graph. Node
// structure is frozen once built; only root values change afterwards.
// Every root owns the last fetched value of its subtree in a `watch`
// channel, and descendants read through it by walking their segment
// chain, so a single root fetch updates the whole subtree at once.

mod builder;
mod refresh;

use std::fmt;

use serde_json::Value;
use tokio::sync::watch;

use crate::config::ObjectConfig;
use crate::entity::{EntityDescriptor, EntityKind, unique_id};

pub(crate) use builder::TreeBuilder;

/// Stable index of a node inside its [`ObjectTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape of a node, decided once when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// Backed by a JSON object; owns children.
    Composite,
    /// Backed by a single scalar.
    Leaf,
}

/// Where a root re-reads its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSource {
    /// `GetObject?<path>`.
    Object(String),
    /// The `GetInfo` block.
    Info,
}

impl RootSource {
    /// Path segment used for the root node.
    pub fn segment(&self) -> &str {
        match self {
            Self::Object(path) => path,
            Self::Info => tecoapi_api::Service::GetInfo.as_str(),
        }
    }
}

/// Value storage owned by a root.
pub(crate) struct RootSlot {
    pub(crate) source: RootSource,
    pub(crate) value: watch::Sender<Value>,
}

/// One node of the tree.
pub struct TreeNode {
    id: NodeId,
    segment: String,
    full_path: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shape: NodeShape,
    name: String,
    device_class: Option<String>,
    unit_of_measurement: Option<String>,
    slot: Option<RootSlot>,
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Key under the parent (the object path for roots).
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Dotted path from the root; the node's address on the device.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_class(&self) -> Option<&str> {
        self.device_class.as_deref()
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.unit_of_measurement.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn source(&self) -> Option<&RootSource> {
        self.slot.as_ref().map(|s| &s.source)
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("full_path", &self.full_path)
            .field("shape", &self.shape)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// All nodes of one platform (sensor, binary sensor or switch).
pub struct ObjectTree {
    kind: EntityKind,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    registered: Vec<NodeId>,
}

impl fmt::Debug for ObjectTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTree")
            .field("kind", &self.kind)
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl ObjectTree {
    pub(crate) fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            roots: Vec::new(),
            registered: Vec::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Nodes exposed as entities, in first-discovered order.
    pub fn registered(&self) -> &[NodeId] {
        &self.registered
    }

    pub fn find(&self, full_path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.full_path == full_path)
            .map(|n| n.id)
    }

    pub fn find_root(&self, segment: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.nodes[id.0].segment == segment)
    }

    // ── Construction ─────────────────────────────────────────────────

    /// Append a node, linking it under `parent`.
    ///
    /// Roots get a value slot holding `Value::Null` until
    /// [`install_root_value`](Self::install_root_value) is called.
    pub(crate) fn push_node(
        &mut self,
        segment: &str,
        parent: Option<NodeId>,
        shape: NodeShape,
        config: &ObjectConfig,
        source: Option<RootSource>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (full_path, name) = match parent {
            Some(p) => {
                let parent = &self.nodes[p.0];
                (
                    format!("{}.{segment}", parent.full_path),
                    config
                        .explicit_name()
                        .map_or_else(|| format!("{} {segment}", parent.name), str::to_owned),
                )
            }
            None => (
                segment.to_owned(),
                config.explicit_name().unwrap_or(segment).to_owned(),
            ),
        };

        let slot = parent.is_none().then(|| RootSlot {
            source: source.unwrap_or_else(|| RootSource::Object(segment.to_owned())),
            value: watch::Sender::new(Value::Null),
        });

        self.nodes.push(TreeNode {
            id,
            segment: segment.to_owned(),
            full_path,
            parent,
            children: Vec::new(),
            shape,
            name,
            device_class: config.device_class.clone(),
            unit_of_measurement: config.unit_of_measurement.clone(),
            slot,
        });

        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Store the value a root was built from.
    pub(crate) fn install_root_value(&self, root: NodeId, value: Value) {
        if let Some(slot) = self.slot(root) {
            slot.value.send_replace(value);
        }
    }

    pub(crate) fn mark_registered(&mut self, ids: &[NodeId]) {
        self.registered.extend_from_slice(ids);
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub(crate) fn slot(&self, root: NodeId) -> Option<&RootSlot> {
        self.nodes.get(root.0).and_then(|n| n.slot.as_ref())
    }

    /// The root owning `id`, and the segments leading from it to `id`.
    ///
    /// `None` for an id that does not belong to this tree.
    fn chain(&self, id: NodeId) -> Option<(NodeId, Vec<&str>)> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = self.nodes.get(current.0)?;
            match node.parent {
                Some(parent) => {
                    segments.push(node.segment.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        segments.reverse();
        Some((current, segments))
    }

    /// The root owning `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.chain(id).map(|(root, _)| root)
    }

    /// Every node below `id` (or `id` itself) that has no children.
    ///
    /// Empty for an id that does not belong to this tree.
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.0) else {
                continue;
            };
            if node.children.is_empty() {
                out.push(current);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Run `f` against the current value of `id`, read through its root.
    ///
    /// `None` when the node's position no longer exists in the last
    /// fetched payload.
    pub fn with_value<R>(&self, id: NodeId, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let Some((root, segments)) = self.chain(id) else {
            return f(None);
        };
        match self.slot(root) {
            Some(slot) => {
                let value = slot.value.borrow();
                f(lookup(&value, &segments))
            }
            None => f(None),
        }
    }

    /// Owned copy of the current value of `id`.
    pub fn effective_value(&self, id: NodeId) -> Option<Value> {
        self.with_value(id, |v| v.cloned())
    }

    /// Sensor state: nothing for nodes with children, else the value.
    pub fn state(&self, id: NodeId) -> Option<Value> {
        let node = self.node(id)?;
        if node.children.is_empty() {
            self.effective_value(id)
        } else {
            None
        }
    }

    /// OR over children when there are any, else the stored boolean.
    pub fn is_on(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.children.is_empty() {
            self.with_value(id, |v| v.and_then(Value::as_bool).unwrap_or(false))
        } else {
            node.children.iter().any(|&child| self.is_on(child))
        }
    }

    /// Watch a root's value; wakes on every refresh and committed write.
    pub fn subscribe(&self, root: NodeId) -> Option<watch::Receiver<Value>> {
        self.slot(root).map(|s| s.value.subscribe())
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the value at `id`'s position inside its root's payload.
    ///
    /// Returns `false` when the parent position no longer holds an object.
    pub(crate) fn store_value(&self, id: NodeId, new_value: Value) -> bool {
        let Some((root, segments)) = self.chain(id) else {
            return false;
        };
        let Some(slot) = self.slot(root) else {
            return false;
        };

        slot.value.send_if_modified(move |stored| {
            let Some((last, parents)) = segments.split_last() else {
                *stored = new_value;
                return true;
            };
            match lookup_mut(stored, parents) {
                Some(Value::Object(map)) => {
                    map.insert((*last).to_owned(), new_value);
                    true
                }
                _ => false,
            }
        })
    }

    /// Registration descriptor for `id`.
    pub fn descriptor(&self, id: NodeId) -> Option<EntityDescriptor> {
        let node = self.node(id)?;
        Some(EntityDescriptor {
            unique_id: unique_id(self.kind, &node.full_path),
            name: node.name.clone(),
            kind: self.kind,
            full_path: node.full_path.clone(),
            device_class: node.device_class.clone(),
            unit_of_measurement: match self.kind {
                EntityKind::Sensor => node.unit_of_measurement.clone(),
                EntityKind::BinarySensor | EntityKind::Switch => None,
            },
        })
    }
}

fn lookup<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| current.get(*segment))
}

fn lookup_mut<'a>(value: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| current.get_mut(*segment))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    /// `A: {B: true, C: {D: false}}` built by hand.
    fn sample() -> (ObjectTree, [NodeId; 4]) {
        let mut tree = ObjectTree::new(EntityKind::Switch);
        let empty = ObjectConfig::default();
        let a = tree.push_node("A", None, NodeShape::Composite, &empty, None);
        let b = tree.push_node("B", Some(a), NodeShape::Leaf, &empty, None);
        let c = tree.push_node(
            "C",
            Some(a),
            NodeShape::Composite,
            &ObjectConfig::new("C").with_name("Cellar"),
            None,
        );
        let d = tree.push_node("D", Some(c), NodeShape::Leaf, &empty, None);
        tree.install_root_value(a, json!({"B": true, "C": {"D": false}}));
        (tree, [a, b, c, d])
    }

    #[test]
    fn full_paths_join_segments() {
        let (tree, [a, b, c, d]) = sample();
        assert_eq!(tree.node(a).unwrap().full_path(), "A");
        assert_eq!(tree.node(b).unwrap().full_path(), "A.B");
        assert_eq!(tree.node(c).unwrap().full_path(), "A.C");
        assert_eq!(tree.node(d).unwrap().full_path(), "A.C.D");
        assert_eq!(tree.find("A.C.D"), Some(d));
    }

    #[test]
    fn names_derive_from_parent_unless_configured() {
        let (tree, [a, b, c, d]) = sample();
        assert_eq!(tree.node(a).unwrap().name(), "A");
        assert_eq!(tree.node(b).unwrap().name(), "A B");
        assert_eq!(tree.node(c).unwrap().name(), "Cellar");
        assert_eq!(tree.node(d).unwrap().name(), "Cellar D");
    }

    #[test]
    fn children_read_through_root() {
        let (tree, [a, b, _, d]) = sample();
        assert_eq!(tree.effective_value(b), Some(json!(true)));
        assert_eq!(tree.effective_value(d), Some(json!(false)));

        tree.install_root_value(a, json!({"B": false, "C": {"D": true}}));
        assert_eq!(tree.effective_value(b), Some(json!(false)));
        assert_eq!(tree.effective_value(d), Some(json!(true)));
    }

    #[test]
    fn is_on_is_or_over_children() {
        let (tree, [a, b, c, _]) = sample();
        assert!(tree.is_on(b));
        assert!(!tree.is_on(c));
        assert!(tree.is_on(a));

        tree.store_value(b, json!(false));
        assert!(!tree.is_on(a));
    }

    #[test]
    fn store_value_updates_nested_position() {
        let (tree, [a, _, _, d]) = sample();
        assert!(tree.store_value(d, json!(true)));
        assert_eq!(
            tree.effective_value(a),
            Some(json!({"B": true, "C": {"D": true}}))
        );
    }

    #[test]
    fn store_value_on_root_replaces_scalar() {
        let mut tree = ObjectTree::new(EntityKind::Switch);
        let root = tree.push_node("X", None, NodeShape::Leaf, &ObjectConfig::default(), None);
        tree.install_root_value(root, json!(false));
        assert!(tree.store_value(root, json!(true)));
        assert_eq!(tree.effective_value(root), Some(json!(true)));
    }

    #[test]
    fn store_value_fails_when_parent_vanished() {
        let (tree, [a, _, _, d]) = sample();
        tree.install_root_value(a, json!({"B": true}));
        assert!(!tree.store_value(d, json!(true)));
        assert_eq!(tree.effective_value(d), None);
    }

    #[test]
    fn leaves_under_keeps_discovery_order() {
        let (tree, [a, b, _, d]) = sample();
        assert_eq!(tree.leaves_under(a), vec![b, d]);
        assert_eq!(tree.leaves_under(b), vec![b]);
    }

    #[test]
    fn foreign_ids_are_rejected_without_panicking() {
        let (tree, [a, _, _, d]) = sample();
        let foreign = NodeId(tree.len() + 3);

        assert_eq!(tree.root_of(d), Some(a));
        assert_eq!(tree.root_of(foreign), None);
        assert!(tree.leaves_under(foreign).is_empty());
        assert_eq!(tree.effective_value(foreign), None);
        assert!(!tree.is_on(foreign));
        assert!(!tree.store_value(foreign, json!(true)));
    }

    #[test]
    fn composite_state_is_none() {
        let mut tree = ObjectTree::new(EntityKind::Sensor);
        let empty = ObjectConfig::default();
        let root = tree.push_node("R", None, NodeShape::Composite, &empty, None);
        let t = tree.push_node("T", Some(root), NodeShape::Leaf, &empty, None);
        tree.install_root_value(root, json!({"T": 21.5}));
        assert_eq!(tree.state(root), None);
        assert_eq!(tree.state(t), Some(json!(21.5)));
    }

    #[test]
    fn descriptor_drops_unit_for_switches() {
        let mut tree = ObjectTree::new(EntityKind::Switch);
        let root = tree.push_node(
            "Relay.K1",
            None,
            NodeShape::Leaf,
            &ObjectConfig::new("Relay.K1").with_unit("V"),
            None,
        );
        let descriptor = tree.descriptor(root).unwrap();
        assert_eq!(descriptor.unique_id, "switch.tecoapi_relay_k1");
        assert_eq!(descriptor.unit_of_measurement, None);
    }

    #[test]
    fn subscribers_see_writes() {
        let (tree, [a, b, _, _]) = sample();
        let mut rx = tree.subscribe(a).unwrap();
        tree.store_value(b, json!(false));
        assert!(rx.has_changed().unwrap());
    }
}
