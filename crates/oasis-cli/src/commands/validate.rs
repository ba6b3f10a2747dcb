//! Implementation of the `oasis validate` command.
//!
//! Loads and validates a configuration file independently of the other
//! subcommands, so every error can be reported at once rather than
//! aborting `main` on the first one.

use oasis_core::config::Config;

pub fn execute(config_path: &str, show: bool) -> anyhow::Result<()> {
    let config = match Config::load_and_validate(Some(config_path)) {
        Ok(config) => config,
        Err(errors) => {
            eprintln!("config invalid ({} error(s)):", errors.len());
            for e in &errors {
                eprintln!("  - {e}");
            }
            anyhow::bail!("validation failed for {config_path}");
        }
    };

    println!("config OK: {config_path}");
    if show {
        let pretty = toml::to_string_pretty(&config).map_err(|e| anyhow::anyhow!("failed to render config: {e}"))?;
        println!("{pretty}");
    }
    Ok(())
}
