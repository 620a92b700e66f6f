// ── Entity kinds and registration descriptors ──

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Integration domain used to namespace entity ids.
pub const DOMAIN: &str = "tecoapi";

/// The platform an object tree is exposed on.
///
/// Fixed per tree at build time; decides which leaf values are accepted
/// and whether the entity can be written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sensor,
    BinarySensor,
    Switch,
}

impl EntityKind {
    /// Entity domain prefix (`sensor`, `binary_sensor`, `switch`).
    pub fn domain(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Switch => "switch",
        }
    }

    /// How often each root of this kind re-polls the device.
    pub fn scan_interval(self) -> Duration {
        match self {
            Self::Sensor | Self::Switch => Duration::from_secs(3),
            Self::BinarySensor => Duration::from_secs(1),
        }
    }

    pub fn is_writable(self) -> bool {
        self == Self::Switch
    }

    /// Whether `value` can back a leaf of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Sensor => matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_)),
            Self::BinarySensor | Self::Switch => value.is_boolean(),
        }
    }
}

/// Build the platform-wide unique id for an object path:
/// `<domain>.tecoapi_<path lowercased, dots as underscores>`.
pub fn unique_id(kind: EntityKind, full_path: &str) -> String {
    format!(
        "{}.{DOMAIN}_{}",
        kind.domain(),
        full_path.to_lowercase().replace('.', "_")
    )
}

/// Everything a host needs to register one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub unique_id: String,
    pub name: String,
    pub kind: EntityKind,
    pub full_path: String,
    pub device_class: Option<String>,
    /// Sensors only.
    pub unit_of_measurement: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unique_id_is_namespaced_and_flattened() {
        assert_eq!(unique_id(EntityKind::Switch, "A.B"), "switch.tecoapi_a_b");
        assert_eq!(
            unique_id(EntityKind::BinarySensor, "Doors.Front"),
            "binary_sensor.tecoapi_doors_front"
        );
        assert_eq!(unique_id(EntityKind::Sensor, "X"), "sensor.tecoapi_x");
    }

    #[test]
    fn boolean_kinds_reject_scalars() {
        assert!(EntityKind::Switch.accepts(&json!(true)));
        assert!(!EntityKind::Switch.accepts(&json!(1)));
        assert!(!EntityKind::BinarySensor.accepts(&json!("on")));
    }

    #[test]
    fn sensor_accepts_any_scalar_but_not_null() {
        assert!(EntityKind::Sensor.accepts(&json!(42)));
        assert!(EntityKind::Sensor.accepts(&json!("idle")));
        assert!(EntityKind::Sensor.accepts(&json!(false)));
        assert!(!EntityKind::Sensor.accepts(&Value::Null));
        assert!(!EntityKind::Sensor.accepts(&json!([1, 2])));
    }

    #[test]
    fn scan_intervals() {
        assert_eq!(EntityKind::BinarySensor.scan_interval(), Duration::from_secs(1));
        assert_eq!(EntityKind::Switch.scan_interval(), Duration::from_secs(3));
    }

    #[test]
    fn kind_display_matches_domain() {
        assert_eq!(EntityKind::BinarySensor.to_string(), "binary_sensor");
        assert_eq!(EntityKind::Sensor.as_ref(), EntityKind::Sensor.domain());
    }
}
