use {
    std::{env, fmt, str::FromStr},
    serde::Deserialize,
    thiserror::Error,
};

pub const ENV_TABLE_NAME: &str = "COUNTER_TABLE_NAME";
pub const ENV_MISSING_RECORD: &str = "COUNTER_MISSING_RECORD";

/// What to do when the counter record (or its `counter` attribute) does not exist.
#[derive(Deserialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(try_from = "String")]
pub enum MissingRecordPolicy {
    /// Count from zero.
    #[default]
    Lenient,
    /// Fail the invocation.
    Strict,
}

#[derive(Error, Debug, Eq, PartialEq)]
#[error("unknown missing record policy: {0:?}, expected \"lenient\" or \"strict\"")]
pub struct UnknownPolicyError(String);

impl FromStr for MissingRecordPolicy {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(UnknownPolicyError(other.to_owned())),
        }
    }
}

impl TryFrom<String> for MissingRecordPolicy {
    type Error = UnknownPolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MissingRecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        })
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct HandlerConfig {
    /// Name of the backing table. Left unset, every invocation fails.
    pub table_name: Option<String>,
    pub missing_record: MissingRecordPolicy,
}

impl HandlerConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            missing_record: MissingRecordPolicy::default(),
        }
    }

    pub fn with_missing_record_policy(mut self, missing_record: MissingRecordPolicy) -> Self {
        self.missing_record = missing_record;
        self
    }

    /// Applies `COUNTER_TABLE_NAME` and `COUNTER_MISSING_RECORD` on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, UnknownPolicyError> {
        self.with_overrides(env::var(ENV_TABLE_NAME).ok(), env::var(ENV_MISSING_RECORD).ok())
    }

    pub fn with_overrides(mut self, table_name: Option<String>, missing_record: Option<String>) -> Result<Self, UnknownPolicyError> {
        if let Some(table_name) = table_name.filter(|v| !v.trim().is_empty()) {
            self.table_name = Some(table_name);
        }
        if let Some(missing_record) = missing_record.filter(|v| !v.trim().is_empty()) {
            self.missing_record = missing_record.parse()?;
        }
        Ok(self)
    }
}
