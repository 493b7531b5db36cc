//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::{ConfigAction, ConfigKey};
use crate::config::Config;

pub fn cmd_config(action: ConfigAction) -> Result<()> {
    let path = Config::path();
    print!("{}", run_config(action, &path)?);
    Ok(())
}

/// Apply `action` to the config file at `path` and return what to print.
fn run_config(action: ConfigAction, path: &Path) -> Result<String> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(path);
            let shown = Config {
                api_key: config.api_key.as_deref().map(mask),
                ..config
            };
            toml::to_string_pretty(&shown).context("Failed to serialize config")
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path);
            config.set(key, &value)?;
            config.save_to(path)?;
            let shown = match key {
                ConfigKey::ApiKey => mask(&value),
                _ => value,
            };
            Ok(format!("Set {} = {}\n", key_name(key), shown))
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load_from(path);
            config.unset(key);
            config.save_to(path)?;
            Ok(format!("Unset {}\n", key_name(key)))
        }
        ConfigAction::Path => Ok(format!("{}\n", path.display())),
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Url => "url",
        ConfigKey::ApiKey => "api_key",
        ConfigKey::PluginId => "plugin_id",
        ConfigKey::Timeout => "timeout",
        ConfigKey::Format => "format",
        ConfigKey::NoColor => "no_color",
    }
}

/// Keep the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mask() {
        assert_eq!(mask("ABCDEFGH"), "****EFGH");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn test_set_show_unset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let out = run_config(
            ConfigAction::Set {
                key: ConfigKey::ApiKey,
                value: "SECRET123456".to_string(),
            },
            &path,
        )
        .unwrap();
        assert_eq!(out, "Set api_key = ********3456\n");

        run_config(
            ConfigAction::Set {
                key: ConfigKey::Url,
                value: "http://octopi.local".to_string(),
            },
            &path,
        )
        .unwrap();

        let shown = run_config(ConfigAction::Show, &path).unwrap();
        assert!(shown.contains("url = \"http://octopi.local\""));
        assert!(shown.contains("3456"));
        assert!(!shown.contains("SECRET"));

        run_config(ConfigAction::Unset { key: ConfigKey::Url }, &path).unwrap();
        assert_eq!(Config::load_from(&path).url, None);
        assert_eq!(
            Config::load_from(&path).api_key.as_deref(),
            Some("SECRET123456")
        );
    }

    #[test]
    fn test_set_rejects_invalid_value_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let result = run_config(
            ConfigAction::Set {
                key: ConfigKey::Timeout,
                value: "soon".to_string(),
            },
            &path,
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_path() {
        let path = Path::new("/tmp/chainprod/config.toml");
        assert_eq!(
            run_config(ConfigAction::Path, path).unwrap(),
            "/tmp/chainprod/config.toml\n"
        );
    }
}
