use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use playtally_config::{Config, CredentialStore, PathManager};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, config: Config, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, &config, paths, output),
        ConfigCommands::Set {
            url,
            apikey,
            user,
            export,
            watched_threshold,
            page_size,
            timeout,
            log_level,
        } => {
            let mut config = config;
            if let Some(url) = url {
                config.server.url = Some(url.trim().trim_end_matches('/').to_string());
            }
            if let Some(timeout) = timeout {
                config.server.timeout_seconds = timeout;
            }
            if let Some(user) = user {
                config.export.user = Some(user);
            }
            if let Some(kind) = export {
                config.export.kind = kind;
            }
            if let Some(threshold) = watched_threshold {
                config.export.watched_threshold = threshold;
            }
            if let Some(page_size) = page_size {
                config.export.page_size = page_size;
            }
            if let Some(level) = log_level {
                config.logging.level = level.to_lowercase();
            }
            set_config(config, apikey, paths, output)
        }
    }
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn set_config(config: Config, apikey: Option<String>, paths: &PathManager, output: &Output) -> Result<()> {
    config
        .validate_values()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    output.success(format!("Configuration saved to {}", config_file.display()));

    if let Some(key) = apikey {
        // `--apikey` with no value asks for the key instead
        let key = if key.trim().is_empty() {
            if !prompts::can_prompt() {
                return Err(eyre!("--apikey needs a value when stdin is not a terminal"));
            }
            prompts::prompt_api_key()?
        } else {
            key.trim().to_string()
        };
        if key.is_empty() {
            return Err(eyre!("API key cannot be empty"));
        }

        let mut cred_store = load_credentials(paths)?;
        cred_store.set_tautulli_api_key(key);
        cred_store
            .save()
            .map_err(|e| eyre!("Failed to save credentials to {}: {}", cred_store.path().display(), e))?;
        output.success(format!("API key saved to {}", cred_store.path().display()));
    }

    Ok(())
}

fn show_config(full: bool, config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let cred_store = load_credentials(paths)?;
    let api_key = match cred_store.tautulli_api_key() {
        Some(key) if full => key.clone(),
        Some(key) => mask_string(key),
        None => "<not set>".to_string(),
    };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if !config_file.exists() {
                output.warn(format!(
                    "No config file at {}, showing defaults. Use 'playtally config set' to create one.",
                    config_file.display()
                ));
            }

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Credentials File").add_attribute(Attribute::Bold),
                Cell::new(cred_store.path().display().to_string()),
            ]);
            print_table(info_table);

            let not_set = || "<not set>".dimmed().to_string();
            let mut server_table = section_table("Server");
            server_table.add_row(vec![
                Cell::new("URL"),
                Cell::new(config.server.url.clone().unwrap_or_else(not_set)),
            ]);
            server_table.add_row(vec![Cell::new("API Key"), Cell::new(&api_key)]);
            server_table.add_row(vec![
                Cell::new("Timeout"),
                Cell::new(format!("{}s", config.server.timeout_seconds)),
            ]);
            print_table(server_table);

            let mut export_table = section_table("Export");
            export_table.add_row(vec![
                Cell::new("User"),
                Cell::new(config.export.user.clone().unwrap_or_else(not_set)),
            ]);
            export_table.add_row(vec![Cell::new("Export"), Cell::new(config.export.kind.as_str())]);
            export_table.add_row(vec![
                Cell::new("Watched Threshold"),
                Cell::new(format!("{}%", config.export.watched_threshold)),
            ]);
            export_table.add_row(vec![Cell::new("Page Size"), Cell::new(config.export.page_size)]);
            print_table(export_table);

            let mut logging_table = section_table("Logging");
            logging_table.add_row(vec![Cell::new("Level"), Cell::new(&config.logging.level)]);
            print_table(logging_table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "credentials_file": cred_store.path().display().to_string(),
                "server": {
                    "url": config.server.url,
                    "api_key": cred_store.tautulli_api_key().map(|_| api_key.clone()),
                    "timeout_seconds": config.server.timeout_seconds,
                },
                "export": {
                    "user": config.export.user,
                    "kind": config.export.kind.as_str(),
                    "watched_threshold": config.export.watched_threshold,
                    "page_size": config.export.page_size,
                },
                "logging": {
                    "level": config.logging.level,
                },
            }));
        }
    }

    Ok(())
}

fn section_table(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(format!("{} Configuration", title))
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)]);
    table
}

fn print_table(mut table: Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    println!();
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("0123456789abcdef"), "01***ef");
    }

    #[test]
    fn test_set_writes_config_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        let output = Output::new(OutputFormat::Json, true);

        let mut config = Config::default();
        config.server.url = Some("http://tautulli.local:8181".to_string());
        set_config(config.clone(), Some("0123456789abcdef".to_string()), &paths, &output).unwrap();

        assert_eq!(Config::load_from_file(&paths.config_file()).unwrap(), config);
        let cred_store = load_credentials(&paths).unwrap();
        assert_eq!(cred_store.tautulli_api_key(), Some(&"0123456789abcdef".to_string()));
    }

    #[test]
    fn test_set_rejects_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        let output = Output::new(OutputFormat::Json, true);

        let mut config = Config::default();
        config.export.watched_threshold = 150.0;
        assert!(set_config(config, None, &paths, &output).is_err());
        assert!(!paths.config_file().exists());
    }
}
