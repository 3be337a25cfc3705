use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub draw: DrawSettings,
    pub sse: SseSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        println!("Loading configuration for RUN_MODE: {}", &run_mode);

        let s = Config::builder()
            // Load environment-specific file (e.g., development.toml, production.toml)
            .add_source(
                File::with_name(&format!("config/{}", run_mode))
                    .format(FileFormat::Toml)
                    .required(true),
            )
            // Add environment variables (e.g., APP_SERVER__PORT=8000)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// 설정 파일 없이 쓰는 기본값. 테스트에서 저장 경로만 바꿔 쓴다.
    pub fn with_saves_dir(saves_dir: impl Into<PathBuf>) -> Self {
        Self {
            logging: LoggingSettings {
                directory: "logs".to_string(),
                filename: "room_server.log".to_string(),
            },
            server: ServerSettings {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                log_level: "info".to_string(),
                metrics_auth_token: None,
            },
            storage: StorageSettings {
                saves_dir: saves_dir.into(),
                deck_path: PathBuf::from("deck.json"),
            },
            draw: DrawSettings::default(),
            sse: SseSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub metrics_auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub directory: String,
    pub filename: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// 방 하나당 `{CODE}.json` 파일 하나.
    pub saves_dir: PathBuf,
    pub deck_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DrawSettings {
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    #[serde(default = "default_max_sequences")]
    pub max_sequences: usize,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            max_sequences: default_max_sequences(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SseSettings {
    /// Idle interval before a keepalive comment is written to the stream.
    #[serde(default = "default_keepalive_seconds")]
    pub keepalive_seconds: u64,
}

impl Default for SseSettings {
    fn default() -> Self {
        Self {
            keepalive_seconds: default_keepalive_seconds(),
        }
    }
}

fn default_count() -> usize {
    deck_core::draw::DEFAULT_COUNT
}

fn default_max_count() -> usize {
    12
}

fn default_max_sequences() -> usize {
    10
}

fn default_keepalive_seconds() -> u64 {
    20
}
