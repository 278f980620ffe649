use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_day_ttl")]
    pub day_cache_ttl_secs: u64,
    #[serde(default = "default_month_ttl")]
    pub month_cache_ttl_secs: u64,
    #[serde(default)]
    pub ai: AiConfig,
}

/// Settings for the day-summary text generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 120,
            temperature: 0.7,
        }
    }
}

impl AiConfig {
    /// Resolve the API key from the environment, if any.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

fn default_user_id() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "local".to_string())
}
fn default_day_ttl() -> u64 {
    5 * 60
}
fn default_month_ttl() -> u64 {
    10 * 60
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            user_id: default_user_id(),
            day_cache_ttl_secs: default_day_ttl(),
            month_cache_ttl_secs: default_month_ttl(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rvisitlog")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rvisitlog")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rvisitlog.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rvisitlog.sqlite")
    }

    pub fn day_ttl(&self) -> Duration {
        Duration::from_secs(self.day_cache_ttl_secs)
    }

    pub fn month_ttl(&self) -> Duration {
        Duration::from_secs(self.month_cache_ttl_secs)
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            Self::from_yaml(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            dir.join("rvisitlog.sqlite")
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(db_path)
    }

    /// Report fields that are missing from the on-disk file (they fall back
    /// to defaults when loaded).
    pub fn missing_fields(content: &str) -> io::Result<Vec<&'static str>> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let expected = [
            "database",
            "user_id",
            "day_cache_ttl_secs",
            "month_cache_ttl_secs",
            "ai",
        ];

        Ok(expected
            .into_iter()
            .filter(|k| value.get(*k).is_none())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = Config::from_yaml("database: /tmp/x.sqlite\nuser_id: alice\n").unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.user_id, "alice");
        assert_eq!(cfg.day_cache_ttl_secs, 300);
        assert_eq!(cfg.month_cache_ttl_secs, 600);
        assert_eq!(cfg.ai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.ai.max_tokens, 120);
    }

    #[test]
    fn partial_ai_section_keeps_other_defaults() {
        let cfg = Config::from_yaml("database: db\nai:\n  model: local-model\n").unwrap();
        assert_eq!(cfg.ai.model, "local-model");
        assert!(cfg.ai.enabled);
        assert!(cfg.ai.endpoint.ends_with("/chat/completions"));
    }

    #[test]
    fn missing_fields_are_reported() {
        let missing = Config::missing_fields("database: db\nuser_id: bob\n").unwrap();
        assert_eq!(missing, vec!["day_cache_ttl_secs", "month_cache_ttl_secs", "ai"]);
    }
}
