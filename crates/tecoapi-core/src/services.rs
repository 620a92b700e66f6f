// ── Services ──
//
// Two user-invoked operations: raw writes by object path, and raw reads
// whose result is handed to the notification sink.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use tecoapi_api::Deadline;

use crate::error::CoreError;
use crate::hub::Hub;
use crate::registry::NotificationSink;

/// Title of the notification posted by [`Hub::get_object`].
pub const GET_OBJECT_TITLE: &str = "TecoAPI get object result";

impl Hub {
    /// Write `value` to `path` on the device.
    ///
    /// Returns whether the device accepted the write. The object trees are
    /// not patched; the next poll picks the change up.
    pub async fn set_object(&self, path: &str, value: Value) -> Result<bool, CoreError> {
        let client = self.client().await?;
        info!(path, "set_object");
        Ok(client.write(Some(path), value).await?)
    }

    /// Read `path` and post the result, pretty-printed, to `notifier`.
    ///
    /// Nothing is posted when the device has no value for `path`.
    pub async fn get_object(
        &self,
        path: &str,
        notifier: &dyn NotificationSink,
    ) -> Result<Option<Value>, CoreError> {
        let client = self.client().await?;
        let value = client.get_object(path, Deadline::Extended).await?;
        debug!(path, found = value.is_some(), "get_object");

        if let Some(found) = &value {
            notifier.notify(GET_OBJECT_TITLE, &pretty(found)?);
        }
        Ok(value)
    }
}

/// JSON with a single-space indent.
fn pretty(value: &Value) -> Result<String, CoreError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut ser).map_err(|e| CoreError::Protocol {
        path: String::new(),
        message: e.to_string(),
    })?;
    String::from_utf8(buf).map_err(|e| CoreError::Protocol {
        path: String::new(),
        message: e.to_string(),
    })
}
