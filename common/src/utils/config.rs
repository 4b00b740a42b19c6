use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_TRIVIAQA_MAX_WORDS: usize = 800;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_triviaqa_max_words")]
    pub triviaqa_max_words: usize,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_triviaqa_max_words() -> usize {
    DEFAULT_TRIVIAQA_MAX_WORDS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            triviaqa_max_words: default_triviaqa_max_words(),
        }
    }
}

/// Loads settings from an optional `squadify` config file in the working
/// directory, then `SQUADIFY_*` environment variables.
pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("squadify").required(false))
        .add_source(Environment::with_prefix("SQUADIFY"))
        .build()?;

    config.try_deserialize()
}
