//! Command handlers.

pub mod config_cmd;
pub mod entities;
pub mod get;
pub mod run;
pub mod set;

use std::path::PathBuf;

use tecoapi_core::Hub;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run => run::handle(hub, global).await,
        Command::Get(args) => get::handle(&args, hub, global).await,
        Command::Set(args) => set::handle(&args, hub, global).await,
        Command::Entities => entities::handle(hub, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}

/// `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(tecoapi_config::config_path)
}
