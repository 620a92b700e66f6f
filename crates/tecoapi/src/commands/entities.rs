//! `entities`: one-shot setup and listing.

use strum::IntoEnumIterator;

use tecoapi_core::{EntityKind, Hub};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, ConsoleSink, EntityView};

pub async fn handle(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    hub.connect().await?;

    let sink = ConsoleSink::new(output::should_color(global.color));
    for kind in EntityKind::iter() {
        if hub.config().has_platform(kind) {
            hub.setup_platform(kind, &sink).await?;
        }
    }

    let views = snapshot(hub).await;
    output::print_output(&output::render_entities(global.output, &views), global.quiet);
    Ok(())
}

/// Current view of every registered entity.
pub async fn snapshot(hub: &Hub) -> Vec<EntityView> {
    hub.entities()
        .await
        .iter()
        .filter_map(EntityView::capture)
        .collect()
}
