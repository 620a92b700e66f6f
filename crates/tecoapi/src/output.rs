//! Output formatting and the console sinks.
//!
//! Entity listings render as a `tabled` table, JSON, or one unique id per
//! line. `ConsoleSink` is the CLI's host side of the hub: registrations
//! and groups go to the log, notifications go to stdout.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info};

use tecoapi_core::{EntityDescriptor, EntityHandle, EntityKind, EntitySink, NotificationSink};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Entity views ─────────────────────────────────────────────────────

/// Snapshot of one entity, as listed by `entities` and `run`.
#[derive(Debug, Serialize)]
pub struct EntityView {
    #[serde(flatten)]
    pub descriptor: EntityDescriptor,
    pub state: Option<Value>,
}

impl EntityView {
    pub fn capture(handle: &EntityHandle) -> Option<Self> {
        let descriptor = handle.descriptor()?;
        let state = match handle.kind() {
            EntityKind::Sensor => handle.state(),
            EntityKind::BinarySensor | EntityKind::Switch => Some(Value::Bool(handle.is_on())),
        };
        Some(Self { descriptor, state })
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Object")]
    path: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

impl From<&EntityView> for EntityRow {
    fn from(v: &EntityView) -> Self {
        Self {
            id: v.descriptor.unique_id.clone(),
            name: v.descriptor.name.clone(),
            path: v.descriptor.full_path.clone(),
            state: format_state(v.descriptor.kind, v.state.as_ref(), false),
            unit: v.descriptor.unit_of_measurement.clone().unwrap_or_default(),
        }
    }
}

/// Human form of an entity state.
pub fn format_state(kind: EntityKind, state: Option<&Value>, color: bool) -> String {
    let text = match (kind, state) {
        (_, None | Some(Value::Null)) => return "unknown".to_owned(),
        (EntityKind::BinarySensor | EntityKind::Switch, Some(v)) => {
            let on = v.as_bool().unwrap_or(false);
            let label = if on { "on" } else { "off" };
            if color {
                return if on {
                    label.green().to_string()
                } else {
                    label.dimmed().to_string()
                };
            }
            label.to_owned()
        }
        (EntityKind::Sensor, Some(Value::String(s))) => s.clone(),
        (EntityKind::Sensor, Some(v)) => v.to_string(),
    };
    if color { text.cyan().to_string() } else { text }
}

// ── Render dispatchers ───────────────────────────────────────────────

pub fn render_entities(format: OutputFormat, views: &[EntityView]) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<EntityRow> = views.iter().map(EntityRow::from).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json_pretty(views),
        OutputFormat::Plain => views
            .iter()
            .map(|v| v.descriptor.unique_id.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Pretty-printed JSON.
pub fn render_json_pretty<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

// ── Console sink ─────────────────────────────────────────────────────

/// Host-side sink for the CLI.
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl EntitySink for ConsoleSink {
    fn register(&self, entities: &[EntityDescriptor]) {
        for e in entities {
            debug!(entity = %e.unique_id, name = %e.name, "registered");
        }
        if let Some(first) = entities.first() {
            info!(platform = %first.kind, count = entities.len(), "entities registered");
        }
    }

    fn create_group(&self, name: &str, entity_ids: &[String]) {
        info!(group = name, members = entity_ids.len(), "group created");
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, title: &str, message: &str) {
        let mut stdout = io::stdout().lock();
        if self.color {
            let _ = writeln!(stdout, "{}", title.bold());
        } else {
            let _ = writeln!(stdout, "{title}");
        }
        let _ = writeln!(stdout, "{message}");
    }
}
