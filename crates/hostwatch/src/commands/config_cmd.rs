//! Config command handlers. These never touch the registry.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Settings};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let mut effective = settings.clone();
            if let Some(server) = &global.server {
                effective.server = Some(server.clone());
            }
            if let Some(timeout) = global.timeout {
                effective.timeout = timeout;
            }
            if let Some(ca_cert) = &global.ca_cert {
                effective.ca_cert = Some(ca_cert.clone());
            }
            effective.insecure |= global.insecure;
            let rendered =
                toml::to_string_pretty(&effective).map_err(|e| CliError::Render(e.to_string()))?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
