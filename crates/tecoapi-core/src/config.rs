// ── Runtime hub configuration ──
//
// These types describe which device to talk to and which objects to
// expose. They never touch disk: `tecoapi-config` (or any other host)
// constructs a `HubConfig` and hands it in.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use tecoapi_api::{BasicAuth, TlsMode, TransportConfig};

use crate::entity::EntityKind;

/// Default deadline for scheduled refreshes.
pub const DEFAULT_POLL_TIMEOUT: Duration = tecoapi_api::transport::DEFAULT_POLL_TIMEOUT;

/// Default deadline for setup and service calls.
pub const DEFAULT_SETUP_TIMEOUT: Duration = tecoapi_api::transport::DEFAULT_EXTENDED_TIMEOUT;

/// Declaration of one exposed object, recursively describing the
/// sub-objects it contains.
///
/// Sub-object declarations only customize naming and presentation; every
/// key the device returns is materialized whether declared or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Object path on the device (a single key for sub-objects).
    pub object: String,

    /// Display name; derived from the path when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    /// Only meaningful for sensors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subobjects: Vec<ObjectConfig>,
}

/// Configuration used for children that have no explicit declaration.
pub(crate) static EMPTY_OBJECT: ObjectConfig = ObjectConfig {
    object: String::new(),
    name: None,
    device_class: None,
    unit_of_measurement: None,
    subobjects: Vec::new(),
};

impl ObjectConfig {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measurement = Some(unit.into());
        self
    }

    pub fn with_device_class(mut self, class: impl Into<String>) -> Self {
        self.device_class = Some(class.into());
        self
    }

    pub fn with_subobject(mut self, child: ObjectConfig) -> Self {
        self.subobjects.push(child);
        self
    }

    /// The declaration for child `key`, or the empty declaration.
    pub fn subobject(&self, key: &str) -> &ObjectConfig {
        self.subobjects
            .iter()
            .find(|c| c.object == key)
            .unwrap_or(&EMPTY_OBJECT)
    }

    /// Configured name, treating an empty string as unset.
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Configuration for one TecoApi device.
///
/// Built by the host, passed to [`Hub`](crate::Hub).
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Service root, e.g. `https://plc.local/TecoApi/`.
    pub resource: Url,
    pub username: String,
    pub password: SecretString,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    pub verify_ssl: bool,
    /// Deadline for scheduled refreshes.
    pub timeout: Duration,
    /// Deadline for tree building, discovery and service calls.
    pub setup_timeout: Duration,
    /// Expose the `GetInfo` block as a sensor tree.
    pub get_info: bool,
    /// Expose every object listed by `GetList` as a sensor tree.
    pub get_list: bool,
    pub switches: Vec<ObjectConfig>,
    pub sensors: Vec<ObjectConfig>,
    pub binary_sensors: Vec<ObjectConfig>,
}

impl HubConfig {
    pub fn new(resource: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            resource,
            username: username.into(),
            password,
            headers: HashMap::new(),
            verify_ssl: true,
            timeout: DEFAULT_POLL_TIMEOUT,
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
            get_info: false,
            get_list: false,
            switches: Vec::new(),
            sensors: Vec::new(),
            binary_sensors: Vec::new(),
        }
    }

    /// Declared roots for one platform.
    pub fn objects(&self, kind: EntityKind) -> &[ObjectConfig] {
        match kind {
            EntityKind::Sensor => &self.sensors,
            EntityKind::BinarySensor => &self.binary_sensors,
            EntityKind::Switch => &self.switches,
        }
    }

    /// Whether a platform has anything to set up.
    pub fn has_platform(&self, kind: EntityKind) -> bool {
        !self.objects(kind).is_empty()
            || (kind == EntityKind::Sensor && (self.get_info || self.get_list))
    }

    /// Translate into the api-level transport settings.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from_verify(self.verify_ssl),
            auth: Some(BasicAuth {
                username: self.username.clone(),
                password: self.password.clone(),
            }),
            headers: self.headers.clone(),
            poll_timeout: self.timeout,
            extended_timeout: self.setup_timeout,
        }
    }
}
