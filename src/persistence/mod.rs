use std::{
    fs,
    path::PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    info,
    warn,
};

use crate::{
    core::NplusError,
    ladder::evaluator::TieBreak,
};

const APP_NAME: &str = "nplusone";
pub const SETTINGS_FILE: &str = "settings.json";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<PathBuf, NplusError> {
    let file_path = get_data_file_path(filename);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&file_path, json)?;
    info!(path = %file_path.display(), "data saved");
    Ok(file_path)
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> Result<T, NplusError> {
    let file_path = get_data_file_path(filename);

    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(&file_path)?;
    let data: T = serde_json::from_str(&json)?;
    info!(path = %file_path.display(), "data loaded");
    Ok(data)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> T {
    match load_json::<T>(filename) {
        Ok(data) => data,
        Err(e) => {
            warn!(filename, error = %e, "failed to load, using defaults");
            T::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub skip: usize,
    pub language: String,
    pub model: String,
    pub batch_size: usize,
    pub min_words: usize,
    pub max_words: usize,
    pub api_base_url: String,
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub max_attempts: usize,
    pub tie_break: TieBreak,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip: 500,
            language: "en".to_string(),
            model: "gpt-5-mini".to_string(),
            batch_size: 10,
            min_words: 5,
            max_words: 8,
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 120,
            max_attempts: 1,
            tie_break: TieBreak::EarliestGenerated,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        load_json_or_default(SETTINGS_FILE)
    }

    pub fn save(&self) -> Result<PathBuf, NplusError> {
        self.validate()?;
        save_json(self, SETTINGS_FILE)
    }

    pub fn validate(&self) -> Result<(), NplusError> {
        if self.batch_size == 0 {
            return Err(NplusError::InvalidSettings("batch_size must be at least 1".into()));
        }
        if self.min_words == 0 || self.min_words > self.max_words {
            return Err(NplusError::InvalidSettings(format!(
                "word range {}..={} is empty",
                self.min_words, self.max_words
            )));
        }
        if self.max_attempts == 0 {
            return Err(NplusError::InvalidSettings("max_attempts must be at least 1".into()));
        }
        if self.language.trim().is_empty() {
            return Err(NplusError::InvalidSettings("language code is empty".into()));
        }
        Ok(())
    }
}
