//! Config command - inspect and edit the configuration file.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    let config_path = Settings::default_config_path();

    match action {
        ConfigAction::Show => {
            if config_path.exists() {
                Output::kv("Config file", &config_path.display().to_string());
            } else {
                Output::kv("Config file", "built-in defaults (no file on disk)");
            }
            println!();
            let rendered = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            print!("{}", rendered);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!(
                    "Wrote default config to {}",
                    config_path.display()
                ));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    // Re-parse so a broken edit surfaces now, not on the next run
                    match Settings::load_from(Some(&config_path)) {
                        Ok(_) => Output::success("Configuration updated."),
                        Err(e) => {
                            Output::error(&format!("Edited config does not parse: {}", e));
                            Output::info(&format!("Fix it at: {}", config_path.display()));
                        }
                    }
                }
                Ok(_) => {
                    Output::warning(&format!("{} exited with an error; file left as-is.", editor));
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor '{}': {}", editor, e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }
    }

    Ok(())
}
