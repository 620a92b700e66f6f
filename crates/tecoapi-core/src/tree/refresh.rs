// ── Refresh & write protocol ──
//
// Roots re-poll on their own schedule and replace their payload wholesale.
// Writes go leaf by leaf through the client and patch the root payload
// only after the device accepted them, so the next poll always wins.

use serde_json::Value;
use tracing::{debug, error, warn};

use tecoapi_api::{Deadline, TecoClient};

use super::{NodeId, ObjectTree, RootSource};
use crate::error::CoreError;

impl ObjectTree {
    /// Re-fetch `root` with the poll deadline.
    ///
    /// Returns `true` when a fresh value was stored. On any failure the
    /// previous value is kept.
    pub async fn refresh_root(&self, root: NodeId, client: &TecoClient) -> bool {
        let Some(slot) = self.slot(root) else {
            debug!(node = %root, "refresh requested for a non-root node");
            return false;
        };

        let fetched = match &slot.source {
            RootSource::Object(path) => client.get_object(path, Deadline::Poll).await,
            RootSource::Info => client.get_info(Deadline::Poll).await,
        };
        let path = slot.source.segment();

        match fetched {
            Ok(Some(value)) => {
                slot.value.send_replace(value);
                true
            }
            Ok(None) => {
                error!(path, "unable to update");
                false
            }
            Err(e) if e.is_transient() => {
                warn!(path, error = %e, "error while fetching data");
                false
            }
            Err(e) => {
                error!(path, error = %e, "error while fetching data");
                false
            }
        }
    }

    /// Command a switch node on or off.
    ///
    /// Nodes with children fan out to every leaf below them, each written
    /// independently. Returns `true` only if every write was accepted.
    pub async fn set(&self, id: NodeId, on: bool, client: &TecoClient) -> Result<bool, CoreError> {
        let node = self.node(id).ok_or_else(|| CoreError::NotFound {
            identifier: id.to_string(),
        })?;
        if !self.kind().is_writable() {
            return Err(CoreError::ReadOnly {
                entity: node.full_path().to_owned(),
            });
        }

        let mut committed = true;
        for leaf in self.leaves_under(id) {
            committed &= self.write_leaf(leaf, Value::Bool(on), client).await;
        }
        Ok(committed)
    }

    async fn write_leaf(&self, leaf: NodeId, value: Value, client: &TecoClient) -> bool {
        let Some(node) = self.node(leaf) else {
            return false;
        };
        let path = node.full_path();

        match client.write(Some(path), value.clone()).await {
            Ok(true) => {
                if !self.store_value(leaf, value) {
                    warn!(path, "write accepted but object is missing from the last poll");
                }
                true
            }
            Ok(false) => {
                debug!(path, "write rejected, keeping previous value");
                false
            }
            Err(e) => {
                error!(path, error = %e, "error while switching");
                false
            }
        }
    }
}
