pub use crate::{
    config::{HandlerConfig, MissingRecordPolicy, UnknownPolicyError, ENV_MISSING_RECORD, ENV_TABLE_NAME},
    error::CounterError,
};

use {
    tracing::{info, error, info_span},
    tally_core::{
        AttributeValue,
        CounterRecord,
        HandlerContext,
        HandlerEvent,
        HandlerResponse,
        Item,
        SuccessBody,
        UpdateExpression,
        COUNTER_ATTRIBUTE,
    },
    tally_store::{BoxedTable, Table, TableRegistry},
};

mod config;
mod error;

/// Increments the shared counter once per invocation.
///
/// The read and the write are separate table calls with no condition on the
/// write, so concurrent invocations can overwrite each other's increments.
#[derive(Clone)]
pub struct CounterHandler {
    tables: TableRegistry,
    config: HandlerConfig,
}

impl CounterHandler {
    pub fn new(tables: TableRegistry, config: HandlerConfig) -> Self {
        Self {
            tables,
            config,
        }
    }

    /// Never fails: every error turns into a 500 response with the cause in the body.
    pub fn handle(&self, _event: &HandlerEvent, ctx: &HandlerContext) -> HandlerResponse {
        let span = info_span!("counter", request_id = ctx.request_id.as_deref().unwrap_or("-"));
        let _guard = span.enter();

        let result = self.increment().and_then(|counter| {
            HandlerResponse::json(&SuccessBody::new(counter.to_string()))
                .map_err(|err| CounterError::SerializationError { reason: format!("failed to encode response body: {err:?}") })
        });

        match result {
            Ok(response) => response,
            Err(err) => {
                error!("failed to increment counter: {err}");
                HandlerResponse::error(err)
            }
        }
    }

    /// Reads the counter, adds one and writes it back. Returns the new value.
    pub fn increment(&self) -> Result<u64, CounterError> {
        let table = self.table()?;
        let key = CounterRecord::key();

        let item = table.get_item(&key)?;
        let next = self.read_counter(item.as_ref())?
            .checked_add(1)
            .ok_or(CounterError::CounterOverflow)?;

        table.update_item(&key, &UpdateExpression::set(COUNTER_ATTRIBUTE, AttributeValue::number(next)))?;
        info!("the counter value is now {next}");

        Ok(next)
    }

    fn table(&self) -> Result<BoxedTable, CounterError> {
        let table_name = self.config.table_name.as_deref()
            .ok_or_else(|| CounterError::ConfigurationError { reason: "counter table name is not set".to_owned() })?;
        Ok(self.tables.resolve(table_name)?)
    }

    fn read_counter(&self, item: Option<&Item>) -> Result<u64, CounterError> {
        let Some(item) = item else {
            return match self.config.missing_record {
                MissingRecordPolicy::Lenient => Ok(0),
                MissingRecordPolicy::Strict => Err(CounterError::RecordNotFound { id: CounterRecord::key().id }),
            };
        };

        match item.get(COUNTER_ATTRIBUTE) {
            Some(value) => parse_counter(value),
            None => match self.config.missing_record {
                MissingRecordPolicy::Lenient => Ok(0),
                MissingRecordPolicy::Strict => Err(CounterError::AttributeMissing { attribute: COUNTER_ATTRIBUTE.to_owned() }),
            },
        }
    }
}

fn parse_counter(value: &AttributeValue) -> Result<u64, CounterError> {
    match value {
        AttributeValue::Number(v) => v.trim().parse()
            .map_err(|_| CounterError::InvalidCounterValue { value: v.clone() }),
        other => Err(CounterError::InvalidCounterValue { value: other.to_string() }),
    }
}
