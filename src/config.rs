use serde::Deserialize;

pub const DEFAULT_SERVER: &str = "localhost:6379";

/// Connection and key-scoping options for a [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port`, or a full `redis://` / `rediss://` URL
    pub server: String,
    /// Prefix shared with consumers; keys become `<namespace>:<key>`
    pub namespace: Option<String>,
    /// Idle connections kept in the pool
    pub max_idle: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            namespace: None,
            max_idle: 1,
        }
    }
}

impl ClientConfig {
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// URL handed to the Redis client
    pub fn redis_url(&self) -> String {
        if self.server.contains("://") {
            self.server.clone()
        } else {
            format!("redis://{}", self.server)
        }
    }

    /// Scope `key` to the configured namespace, if any
    pub fn namespaced_key(&self, key: &str) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{}:{}", ns, key),
            _ => key.to_string(),
        }
    }
}
