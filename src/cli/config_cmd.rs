//! `config`: show and change persisted settings.

use super::utils::load_config;
use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the current configuration
    Show,

    /// Set the default archive folder
    SetDefaultFolder { folder: String },

    /// Clear the default archive folder
    ClearDefaultFolder,

    /// Set the poppler binary directory used for PDF rasterization
    SetPopplerPath { path: String },

    /// Enable or disable the companion web server
    SetWebServerEnabled { enabled: bool },

    /// Set the companion web server port
    SetWebServerPort { port: u16 },
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let mut store = load_config()?;
    match command {
        ConfigCommand::Show => {
            let config = &store.config;
            println!("{}", style("Configuration").bold());
            println!("  default_folder     = {}", config.default_folder);
            println!("  web_server_enabled = {}", config.web_server_enabled);
            println!("  web_server_port    = {}", config.web_server_port);
            println!("  poppler_path       = {}", config.poppler_path);
            for (key, value) in &config.extra {
                println!("  {key} = {value}");
            }
            return Ok(());
        }
        ConfigCommand::SetDefaultFolder { folder } => store
            .set_default_folder(&folder)
            .context("saving configuration")?,
        ConfigCommand::ClearDefaultFolder => store
            .set_default_folder("")
            .context("saving configuration")?,
        ConfigCommand::SetPopplerPath { path } => store
            .set_poppler_path(&path)
            .context("saving configuration")?,
        ConfigCommand::SetWebServerEnabled { enabled } => store
            .set_web_server_enabled(enabled)
            .context("saving configuration")?,
        ConfigCommand::SetWebServerPort { port } => store
            .set_web_server_port(port)
            .context("saving configuration")?,
    }
    println!("{} configuration saved", style("Done:").green().bold());
    Ok(())
}
