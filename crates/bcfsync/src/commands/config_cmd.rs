//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            for controller in cfg
                .profiles
                .values_mut()
                .flat_map(|p| p.controllers.iter_mut())
            {
                if controller.password.is_some() {
                    controller.password = Some(REDACTED.into());
                }
            }
            let toml = cfg.to_toml()?;
            let out = output::render_single(global.output, &cfg, |_| toml.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
