use {
    std::{env, path::{Path, PathBuf}, str::FromStr},
    tokio::fs,
    serde::Deserialize,
    tracing::Level,
    tally_handler::{HandlerConfig, MissingRecordPolicy},
    crate::error::ConfigLoadError,
};

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TABLE_NAME: &str = "counter-table";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(skip_deserializing)]
    pub config_path: Option<PathBuf>,

    pub port: u16,

    /// Value callers must send in `x-api-key`. No key configured means no check.
    pub api_key: Option<String>,

    /// Table the counter lives in, usually provided through `COUNTER_TABLE_NAME`.
    pub table_name: Option<String>,

    pub missing_record: MissingRecordPolicy,

    pub logger: LoggerConfig,

    pub tables: Vec<TableConfig>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub name: String,

    #[serde(flatten)]
    pub driver: TableDriverConfig,

    /// Counter value written when the table has no counter record yet.
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "driver")]
pub enum TableDriverConfig {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "sqlite")]
    Sqlite {
        path: Option<String>,
        in_memory: Option<bool>,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            port: DEFAULT_PORT,
            api_key: None,
            table_name: None,
            missing_record: MissingRecordPolicy::default(),
            logger: LoggerConfig::default(),
            tables: vec![TableConfig {
                name: DEFAULT_TABLE_NAME.to_owned(),
                driver: TableDriverConfig::Memory,
                seed: Some(0),
            }],
        }
    }
}

impl ServerConfig {
    pub async fn load(file_path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let file_path = file_path.as_ref();
        let content = fs::read_to_string(file_path).await
            .map_err(ConfigLoadError::FailedToRead)?;
        let mut config = Self::from_yaml(&content)?;
        config.config_path = Some(file_path.to_path_buf());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigLoadError> {
        serde_yml::from_str(content).map_err(ConfigLoadError::FailedToParse)
    }

    /// Applies `COUNTER_TABLE_NAME`, `COUNTER_MISSING_RECORD` and `LOG_LEVEL`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigLoadError> {
        let handler = self.handler_config()
            .with_env_overrides()
            .map_err(|err| ConfigLoadError::InvalidValue { reason: err.to_string() })?;
        self.with_handler_config(handler)
            .with_log_level(env::var(ENV_LOG_LEVEL).ok())
    }

    pub fn with_overrides(
        self,
        table_name: Option<String>,
        missing_record: Option<String>,
        log_level: Option<String>,
    ) -> Result<Self, ConfigLoadError> {
        let handler = self.handler_config()
            .with_overrides(table_name, missing_record)
            .map_err(|err| ConfigLoadError::InvalidValue { reason: err.to_string() })?;
        self.with_handler_config(handler)
            .with_log_level(log_level)
    }

    fn with_handler_config(mut self, handler: HandlerConfig) -> Self {
        self.table_name = handler.table_name;
        self.missing_record = handler.missing_record;
        self
    }

    fn with_log_level(mut self, log_level: Option<String>) -> Result<Self, ConfigLoadError> {
        if let Some(log_level) = log_level.filter(|v| !v.trim().is_empty()) {
            self.logger.level = Some(log_level);
        }
        self.logger.level()?;
        Ok(self)
    }

    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            table_name: self.table_name.clone(),
            missing_record: self.missing_record,
        }
    }
}

impl LoggerConfig {
    pub fn level(&self) -> Result<Level, ConfigLoadError> {
        match &self.level {
            Some(level) => Level::from_str(level.trim())
                .map_err(|err| ConfigLoadError::InvalidValue { reason: format!("invalid log level {level:?}: {err}") }),
            None => Ok(Level::INFO),
        }
    }
}
