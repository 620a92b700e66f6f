//! `set`: write one object through the set-object service.

use serde_json::Value;

use tecoapi_core::Hub;

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &SetArgs, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let value: Value = serde_json::from_str(&args.value)?;
    hub.connect().await?;

    if hub.set_object(&args.path, value.clone()).await? {
        output::print_output(&format!("{} = {value}", args.path), global.quiet);
        Ok(())
    } else {
        Err(CliError::Rejected {
            path: args.path.clone(),
        })
    }
}
