use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub web_port: u16,
    pub log_level: String,
    pub max_upload_bytes: usize,
    pub jpeg_quality: u8,
}

impl AppConfig {
    pub fn new(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, env)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            .build()?;

        s.try_deserialize()
    }
}
