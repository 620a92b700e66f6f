// tecoapi-core: object trees, polling, and entity registration on top of
// tecoapi-api.
//
// A `Hub` owns the client and one `ObjectTree` per platform (sensor,
// binary_sensor, switch). Trees are built from a single fetch per declared
// root; every root is then re-polled on its own interval and exposes its
// value through a `tokio::sync::watch` channel. Hosts plug in through the
// `EntitySink` and `NotificationSink` traits.

pub mod config;
pub mod entity;
pub mod error;
pub mod hub;
pub mod registry;
pub mod services;
pub mod tree;

pub use config::{HubConfig, ObjectConfig};
pub use entity::{DOMAIN, EntityDescriptor, EntityKind};
pub use error::CoreError;
pub use hub::Hub;
pub use registry::{EntityHandle, EntitySink, MemorySink, NotificationSink, RecordedGroup};
pub use tree::{NodeId, NodeShape, ObjectTree, RootSource, TreeNode};

pub use tecoapi_api::Deadline;
