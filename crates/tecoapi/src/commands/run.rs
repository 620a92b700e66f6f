//! `run`: set everything up, print the entities, then log state changes
//! until Ctrl-C.

use tokio::task::JoinSet;
use tracing::info;

use tecoapi_core::{EntityHandle, Hub};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, ConsoleSink, EntityView};

use super::entities::snapshot;

pub async fn handle(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let sink = ConsoleSink::new(color);

    hub.start(&sink).await?;
    let views = snapshot(hub).await;
    output::print_output(&output::render_entities(global.output, &views), global.quiet);

    let mut watchers = JoinSet::new();
    for handle in hub.entities().await {
        watchers.spawn(watch_entity(handle, color, global.quiet));
    }
    info!(entities = watchers.len(), "polling, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    watchers.abort_all();
    hub.shutdown().await;
    Ok(())
}

/// Print a line whenever the entity's state differs from the last one seen.
async fn watch_entity(handle: EntityHandle, color: bool, quiet: bool) {
    let tree = handle.tree();
    let Some(mut rx) = tree
        .root_of(handle.node())
        .and_then(|root| tree.subscribe(root))
    else {
        return;
    };
    let mut last = EntityView::capture(&handle).and_then(|v| v.state);

    while rx.changed().await.is_ok() {
        let Some(view) = EntityView::capture(&handle) else {
            break;
        };
        if view.state == last {
            continue;
        }
        let line = format!(
            "{} -> {}",
            view.descriptor.unique_id,
            output::format_state(view.descriptor.kind, view.state.as_ref(), color)
        );
        output::print_output(&line, quiet);
        last = view.state;
    }
}
