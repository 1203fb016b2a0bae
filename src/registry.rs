use crate::JobConfig;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry mapping worker types to their job configuration
#[derive(Debug, Default)]
pub struct JobRegistry {
    configs: RwLock<HashMap<TypeId, JobConfig>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the configuration for worker type `W`
    pub fn register<W: 'static>(&self, config: JobConfig) {
        self.configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<W>(), config);
    }

    /// Look up the configuration for worker type `W`
    pub fn lookup<W: 'static>(&self) -> Option<JobConfig> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<W>())
            .cloned()
    }

    pub fn contains<W: 'static>(&self) -> bool {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<W>())
    }

    pub fn len(&self) -> usize {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
