use crate::{
    job::normalize_args,
    store::{Dialer, Pool, RedisDialer},
    ClientConfig, JobConfig, JobId, JobRecord, JobRegistry, KiqueueError, QueueTracker, Result,
    Worker,
};
use redis::{Cmd, Value};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

static GLOBAL: OnceLock<Client> = OnceLock::new();

/// Producer client: registers workers, tracks queues and pushes jobs to Redis
pub struct Client {
    config: ClientConfig,
    registry: JobRegistry,
    tracker: QueueTracker,
    pool: RwLock<Option<Arc<Pool>>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("registered_workers", &self.registry.len())
            .field("queues", &self.tracker.queues())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            registry: JobRegistry::new(),
            tracker: QueueTracker::new(),
            pool: RwLock::new(None),
        }
    }

    /// Make `self` the process-wide client.
    ///
    /// Only the first install succeeds; later calls return
    /// [`KiqueueError::AlreadyInstalled`] and drop the client they were given.
    pub fn install(self) -> Result<&'static Client> {
        let mut fresh = false;
        let client = GLOBAL.get_or_init(|| {
            fresh = true;
            self
        });
        if fresh {
            Ok(client)
        } else {
            Err(KiqueueError::AlreadyInstalled)
        }
    }

    /// The process-wide client, if one has been installed
    pub fn global() -> Option<&'static Client> {
        GLOBAL.get()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn namespaced_key(&self, key: &str) -> String {
        self.config.namespaced_key(key)
    }

    /// Register worker type `W` under an explicit name, queue and retry budget
    pub async fn register<W: Worker>(
        &self,
        name: impl Into<String>,
        queue: impl Into<String>,
        max_retries: u32,
    ) {
        let config = JobConfig::new(name, queue, max_retries);
        let queue = config.queue.clone();
        self.registry.register::<W>(config);
        self.track_queue(&queue).await;
    }

    /// Register worker type `W` using the configuration it declares itself
    pub async fn register_worker<W: Worker>(&self) {
        let config = W::job_config();
        self.register::<W>(config.name, config.queue, config.max_retries)
            .await;
    }

    pub fn lookup<W: Worker>(&self) -> Option<JobConfig> {
        self.registry.lookup::<W>()
    }

    /// Queue names tracked so far, sorted
    pub fn known_queues(&self) -> Vec<String> {
        self.tracker.queues()
    }

    pub fn is_connected(&self) -> bool {
        self.current_pool().is_some()
    }

    /// Connect to the configured server, replacing any existing pool.
    pub async fn connect(&self) -> Result<()> {
        let url = self.config.redis_url();
        let dialer = RedisDialer::open(&url)
            .map_err(|e| KiqueueError::InvalidConfig(format!("server '{}': {}", url, e)))?;
        self.connect_with(dialer).await
    }

    /// Install a pool built on `dialer` and publish every tracked queue to the
    /// discovery set.
    pub async fn connect_with(&self, dialer: impl Dialer) -> Result<()> {
        let pool = Arc::new(Pool::new(dialer, self.config.max_idle));
        let previous = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pool);
        if let Some(previous) = previous {
            previous.close();
            info!("Closed previous connection pool for {}", self.config.server);
        }

        let queues = self.tracker.queues();
        info!(
            "Connected to {} with {} tracked queues",
            self.config.server,
            queues.len()
        );

        // SADD requires at least one member.
        if queues.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("SADD");
        cmd.arg(self.namespaced_key("queues")).arg(&queues);
        self.query(&cmd).await?;
        Ok(())
    }

    /// Run one command on a pooled connection.
    pub async fn query(&self, cmd: &Cmd) -> Result<Value> {
        let pool = self.current_pool().ok_or(KiqueueError::NotConnected)?;
        let mut conn = pool.get().await?;
        Ok(conn.execute(cmd).await?)
    }

    /// Remember `queue` and, once connected, add it to the discovery set.
    ///
    /// Publishing failures are logged and otherwise ignored.
    pub async fn track_queue(&self, queue: &str) {
        if !self.tracker.track(queue) || !self.is_connected() {
            return;
        }
        let mut cmd = redis::cmd("SADD");
        cmd.arg(self.namespaced_key("queues")).arg(queue);
        if let Err(e) = self.query(&cmd).await {
            warn!("Failed to publish queue {} to discovery set: {}", queue, e);
        }
    }

    /// Enqueue a job for the registered worker type of `worker`.
    ///
    /// # Panics
    ///
    /// Panics if `W` was never registered on this client.
    pub async fn enqueue<W: Worker, A: Serialize>(&self, _worker: &W, args: A) -> Result<JobId> {
        let config = match self.registry.lookup::<W>() {
            Some(config) => config,
            None => panic!(
                "kiqueue: unregistered worker type {}",
                std::any::type_name::<W>()
            ),
        };
        self.publish(&config.name, &config, args).await
    }

    /// Enqueue a job without going through the registry
    pub async fn enqueue_with_config<A: Serialize>(
        &self,
        name: &str,
        config: &JobConfig,
        args: A,
    ) -> Result<JobId> {
        self.track_queue(&config.queue).await;
        self.publish(name, config, args).await
    }

    #[instrument(skip_all, fields(queue = %config.queue, job = %name))]
    async fn publish<A: Serialize>(&self, name: &str, config: &JobConfig, args: A) -> Result<JobId> {
        let record = JobRecord::new(name, config, normalize_args(args)?)?;
        let payload = record.to_json()?;

        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(self.queue_key(&config.queue)).arg(payload);
        self.query(&cmd).await?;

        debug!("Enqueued job {} onto {}", record.id, config.queue);
        Ok(record.id)
    }

    fn queue_key(&self, queue: &str) -> String {
        self.namespaced_key(&format!("queue:{}", queue))
    }

    fn current_pool(&self) -> Option<Arc<Pool>> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
