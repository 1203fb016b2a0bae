use crate::{JobId, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Retry budget used when a worker does not pick its own.
pub const DEFAULT_MAX_RETRIES: u32 = 25;

/// Static configuration bound to a worker type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Logical, unnamespaced queue name
    pub queue: String,
    pub max_retries: u32,
    /// Display name written into the record's `Type` field
    pub name: String,
}

impl JobConfig {
    pub fn new(name: impl Into<String>, queue: impl Into<String>, max_retries: u32) -> Self {
        Self {
            queue: queue.into(),
            max_retries,
            name: name.into(),
        }
    }
}

/// Wire form of one job as consumers expect to find it in the queue list.
///
/// Field names are fixed by the consumer protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "Type")]
    pub job_type: String,
    #[serde(rename = "Args")]
    pub args: Vec<Value>,
    #[serde(rename = "Retry")]
    pub retry: u32,
    #[serde(rename = "ID")]
    pub id: JobId,
}

impl JobRecord {
    /// Build a record with a freshly generated id.
    pub fn new(name: &str, config: &JobConfig, args: Vec<Value>) -> Result<Self> {
        Ok(Self {
            job_type: name.to_string(),
            args,
            retry: config.max_retries,
            id: JobId::generate()?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Convert caller-supplied arguments into the list stored under `Args`.
///
/// Unit and `None` become an empty list, arrays (tuples, `Vec`s) are kept,
/// and any other single value is wrapped in a one-element list.
pub fn normalize_args<A: Serialize>(args: A) -> Result<Vec<Value>> {
    Ok(match serde_json::to_value(args)? {
        Value::Null => Vec::new(),
        Value::Array(values) => values,
        other => vec![other],
    })
}

/// Capability implemented by every type that can be enqueued by instance.
///
/// The associated functions provide the defaults used by
/// [`Client::register_worker`](crate::Client::register_worker).
pub trait Worker: Send + Sync + 'static {
    /// Display name consumers dispatch on
    fn name() -> &'static str
    where
        Self: Sized;

    fn queue_name() -> &'static str
    where
        Self: Sized,
    {
        "default"
    }

    fn max_retries() -> u32
    where
        Self: Sized,
    {
        DEFAULT_MAX_RETRIES
    }

    fn job_config() -> JobConfig
    where
        Self: Sized,
    {
        JobConfig::new(Self::name(), Self::queue_name(), Self::max_retries())
    }
}
