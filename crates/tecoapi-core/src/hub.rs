// ── Hub ──
//
// Lifecycle owner for one TecoApi device: the client (and with it the
// request gate), every platform's object tree, and the per-root refresh
// tasks. Cheaply cloneable; clones share everything.

use std::sync::Arc;
use std::time::Duration;

use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tecoapi_api::{Service, TecoClient};

use crate::config::{HubConfig, ObjectConfig};
use crate::entity::EntityKind;
use crate::error::CoreError;
use crate::registry::{EntityHandle, EntitySink, register_tree};
use crate::tree::{NodeId, ObjectTree, RootSource, TreeBuilder};

/// Display name of the `GetInfo` sensor tree.
pub const INFO_NAME: &str = "TecoAPI Info";

/// The main entry point for hosts.
///
/// [`connect()`](Self::connect) prepares the client;
/// [`setup_platform()`](Self::setup_platform) builds and registers one
/// platform; [`start()`](Self::start) does both for every configured
/// platform and spawns the refresh tasks.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    client: Mutex<Option<TecoClient>>,
    trees: Mutex<Vec<Arc<ObjectTree>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Hub {
    /// Create a hub from configuration. Does no I/O.
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                client: Mutex::new(None),
                trees: Mutex::new(Vec::new()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Build the HTTP client. Idempotent.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let mut guard = self.inner.client.lock().await;
        if guard.is_none() {
            let config = &self.inner.config;
            let client = TecoClient::new(config.resource.clone(), &config.transport())?;
            info!(resource = %client.base_url(), "TecoApi client ready");
            *guard = Some(client);
        }
        Ok(())
    }

    /// The shared client, or [`CoreError::NotReady`] before `connect()`.
    pub async fn client(&self) -> Result<TecoClient, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotReady)
    }

    /// Build every declared root of `kind` and register the result.
    ///
    /// Roots that fail to build are logged and skipped; the platform is
    /// still set up with the rest. The sensor platform also carries the
    /// `GetInfo` block and the `GetList` objects when enabled. A root
    /// declared more than once keeps its first declaration.
    pub async fn setup_platform(
        &self,
        kind: EntityKind,
        sink: &dyn EntitySink,
    ) -> Result<Arc<ObjectTree>, CoreError> {
        let client = self.client().await?;
        let config = &self.inner.config;
        let mut builder = TreeBuilder::new(&client, kind);
        let mut per_root = Vec::new();

        for declaration in config.objects(kind) {
            let source = RootSource::Object(declaration.object.clone());
            per_root.extend(builder.build_root(source, declaration).await);
        }

        if kind == EntityKind::Sensor {
            if config.get_info {
                let declaration = ObjectConfig::new(Service::GetInfo.as_str()).with_name(INFO_NAME);
                per_root.extend(builder.build_root(RootSource::Info, &declaration).await);
            }
            if config.get_list {
                for object in builder.discover_list().await {
                    let declaration = ObjectConfig::new(object.clone());
                    per_root.extend(
                        builder
                            .build_root(RootSource::Object(object), &declaration)
                            .await,
                    );
                }
            }
        }

        let tree = builder.finish();
        let descriptors = register_tree(&tree, &per_root, sink);
        info!(
            platform = %kind,
            roots = tree.roots().len(),
            entities = descriptors.len(),
            "platform set up"
        );

        let tree = Arc::new(tree);
        self.inner.trees.lock().await.push(Arc::clone(&tree));
        Ok(tree)
    }

    /// Spawn one refresh task per root of `tree`, at the kind's interval.
    pub async fn spawn_refresh(&self, tree: &Arc<ObjectTree>) -> Result<(), CoreError> {
        let client = self.client().await?;
        let period = tree.kind().scan_interval();
        let mut handles = self.inner.task_handles.lock().await;
        for &root in tree.roots() {
            handles.push(tokio::spawn(refresh_task(
                Arc::clone(tree),
                root,
                client.clone(),
                period,
                self.inner.cancel.child_token(),
            )));
        }
        Ok(())
    }

    /// Connect, set up every configured platform, and start polling.
    pub async fn start(&self, sink: &dyn EntitySink) -> Result<Vec<Arc<ObjectTree>>, CoreError> {
        self.connect().await?;

        let mut trees = Vec::new();
        for kind in EntityKind::iter() {
            if !self.inner.config.has_platform(kind) {
                continue;
            }
            let tree = self.setup_platform(kind, sink).await?;
            self.spawn_refresh(&tree).await?;
            trees.push(tree);
        }
        Ok(trees)
    }

    /// Stop all refresh tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("hub shut down");
    }

    // ── Entity access ────────────────────────────────────────────

    /// Every registered entity across all platforms.
    pub async fn entities(&self) -> Vec<EntityHandle> {
        let Ok(client) = self.client().await else {
            return Vec::new();
        };
        let trees = self.inner.trees.lock().await;
        trees
            .iter()
            .flat_map(|tree| {
                tree.registered()
                    .iter()
                    .map(|&id| EntityHandle::new(Arc::clone(tree), id, client.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Look an entity up by its unique id.
    pub async fn entity(&self, unique_id: &str) -> Option<EntityHandle> {
        self.entities()
            .await
            .into_iter()
            .find(|e| e.descriptor().is_some_and(|d| d.unique_id == unique_id))
    }

    /// The tree set up for `kind`, if any.
    pub async fn tree(&self, kind: EntityKind) -> Option<Arc<ObjectTree>> {
        self.inner
            .trees
            .lock()
            .await
            .iter()
            .find(|t| t.kind() == kind)
            .cloned()
    }
}

/// Poll one root until cancelled.
async fn refresh_task(
    tree: Arc<ObjectTree>,
    root: NodeId,
    client: TecoClient,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // the build already fetched a value

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tree.refresh_root(root, &client).await;
            }
        }
    }
}
