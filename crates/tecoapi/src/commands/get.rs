//! `get`: read one object through the get-object service.

use tecoapi_core::Hub;

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, ConsoleSink};

pub async fn handle(args: &GetArgs, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    hub.connect().await?;

    let notifier = ConsoleSink::new(output::should_color(global.color));
    match hub.get_object(&args.path, &notifier).await? {
        Some(_) => Ok(()),
        None => Err(CliError::NotFound {
            path: args.path.clone(),
        }),
    }
}
