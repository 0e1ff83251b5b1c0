use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::exam::Stage;
use crate::session::StageDurations;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_candidate_name")]
    pub candidate_name: String,
    /// Empty means the platform data dir.
    #[serde(default)]
    pub data_dir: String,
    /// Stage length overrides in minutes for shortened practice runs;
    /// 0 keeps the exam-condition default.
    #[serde(default)]
    pub listening_minutes: u64,
    #[serde(default)]
    pub reading_minutes: u64,
    #[serde(default)]
    pub writing_minutes: u64,
    /// Telegram submission summaries are disabled while either field is
    /// empty.
    #[serde(default)]
    pub telegram_bot_token: String,
    #[serde(default)]
    pub telegram_chat_id: String,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_candidate_name() -> String {
    "anonymous".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            candidate_name: default_candidate_name(),
            data_dir: String::new(),
            listening_minutes: 0,
            reading_minutes: 0,
            writing_minutes: 0,
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fullmock")
            .join("config.toml")
    }

    pub fn stage_durations(&self) -> StageDurations {
        let minutes = |configured: u64, stage: Stage| {
            if configured == 0 {
                Duration::from_secs(stage.default_duration_secs())
            } else {
                Duration::from_secs(configured * 60)
            }
        };
        StageDurations {
            listening: minutes(self.listening_minutes, Stage::Listening),
            reading: minutes(self.reading_minutes, Stage::Reading),
            writing: minutes(self.writing_minutes, Stage::Writing),
        }
    }

    pub fn telegram_enabled(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }
}
