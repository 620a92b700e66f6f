// ── Tree construction ──
//
// A root is fetched once with the extended deadline; everything below it is
// materialized from that single payload without further requests.

use serde_json::Value;
use tracing::{debug, error, warn};

use tecoapi_api::{Deadline, TecoClient};

use super::{NodeId, NodeShape, ObjectTree, RootSource};
use crate::config::ObjectConfig;
use crate::entity::EntityKind;

/// Builds one platform's [`ObjectTree`], root by root.
pub(crate) struct TreeBuilder<'a> {
    client: &'a TecoClient,
    tree: ObjectTree,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(client: &'a TecoClient, kind: EntityKind) -> Self {
        Self {
            client,
            tree: ObjectTree::new(kind),
        }
    }

    pub(crate) fn finish(self) -> ObjectTree {
        self.tree
    }

    /// Fetch a declared root and materialize its subtree.
    ///
    /// Returns the root and the nodes to register, in discovery order. A
    /// failed fetch or an unusable value yields `None` and leaves previously
    /// built roots untouched.
    pub(crate) async fn build_root(
        &mut self,
        source: RootSource,
        config: &ObjectConfig,
    ) -> Option<(NodeId, Vec<NodeId>)> {
        let segment = source.segment().to_owned();
        if self.tree.find_root(&segment).is_some() {
            warn!(path = %segment, "object declared twice, keeping the first");
            return None;
        }

        let fetched = match &source {
            RootSource::Object(path) => self.client.get_object(path, Deadline::Extended).await,
            RootSource::Info => self.client.get_info(Deadline::Extended).await,
        };
        let value = match fetched {
            Ok(Some(value)) => value,
            Ok(None) => {
                error!(path = %segment, "unable to set up");
                return None;
            }
            Err(e) => {
                error!(path = %segment, error = %e, "error while setting up");
                return None;
            }
        };

        let mut registered = Vec::new();
        let root =
            self.materialize(&segment, config, None, &value, Some(source), &mut registered)?;
        self.tree.install_root_value(root, value);
        self.tree.mark_registered(&registered);
        debug!(path = %segment, entities = registered.len(), "object tree built");
        Some((root, registered))
    }

    /// Object ids published by `GetList`.
    ///
    /// The device answers either with an array of names or with an object
    /// keyed by name.
    pub(crate) async fn discover_list(&self) -> Vec<String> {
        match self.client.get_list(Deadline::Extended).await {
            Ok(Some(Value::Array(items))) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id),
                    other => {
                        warn!(item = %other, "ignoring non-string GetList entry");
                        None
                    }
                })
                .collect(),
            Ok(Some(Value::Object(map))) => map.into_iter().map(|(key, _)| key).collect(),
            Ok(Some(other)) => {
                error!(value = %other, "unexpected GetList payload");
                Vec::new()
            }
            Ok(None) => {
                error!("unable to read object list");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "error while reading object list");
                Vec::new()
            }
        }
    }

    /// Materialize `value` as the node `segment` under `parent`.
    ///
    /// Objects become composites and recurse into every key in device
    /// order. A composite is registered only when none of its children
    /// could be built; otherwise its descendants stand in for it. Values
    /// the tree's kind cannot represent produce no node.
    fn materialize(
        &mut self,
        segment: &str,
        config: &ObjectConfig,
        parent: Option<NodeId>,
        value: &Value,
        source: Option<RootSource>,
        out: &mut Vec<NodeId>,
    ) -> Option<NodeId> {
        match value {
            Value::Object(map) => {
                let id = self
                    .tree
                    .push_node(segment, parent, NodeShape::Composite, config, source);
                for (key, child) in map {
                    self.materialize(key, config.subobject(key), Some(id), child, None, out);
                }
                if self.tree.node(id).is_some_and(|n| n.children().is_empty()) {
                    out.push(id);
                }
                Some(id)
            }
            scalar if self.tree.kind().accepts(scalar) => {
                let id = self
                    .tree
                    .push_node(segment, parent, NodeShape::Leaf, config, source);
                out.push(id);
                Some(id)
            }
            other => {
                error!(
                    path = %self.path_of(parent, segment),
                    kind = %self.tree.kind(),
                    value = %other,
                    "unable to set up: unsupported value"
                );
                None
            }
        }
    }

    fn path_of(&self, parent: Option<NodeId>, segment: &str) -> String {
        match parent.and_then(|p| self.tree.node(p)) {
            Some(node) => format!("{}.{segment}", node.full_path()),
            None => segment.to_owned(),
        }
    }
}
