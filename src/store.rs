//! Pooled access to the Redis server.
//!
//! [`Pool`] keeps up to `max_idle` connections around for reuse and dials a
//! new one whenever none is idle. Every checkout is a [`PooledConnection`]
//! guard that hands its connection back when dropped.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Cmd, ErrorKind, RedisError, RedisResult, Value};
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

/// A single connection able to run one command at a time
#[async_trait]
pub trait Connection: Send {
    async fn execute(&mut self, cmd: &Cmd) -> RedisResult<Value>;
}

/// Opens new connections for a [`Pool`]
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self) -> RedisResult<Box<dyn Connection>>;
}

pub struct RedisConnection(MultiplexedConnection);

#[async_trait]
impl Connection for RedisConnection {
    async fn execute(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        cmd.query_async(&mut self.0).await
    }
}

/// Dials a Redis server over TCP (or TLS for `rediss://` URLs)
pub struct RedisDialer {
    client: redis::Client,
}

impl RedisDialer {
    pub fn open(url: &str) -> RedisResult<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }
}

#[async_trait]
impl Dialer for RedisDialer {
    async fn dial(&self) -> RedisResult<Box<dyn Connection>> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(Box::new(RedisConnection(conn)))
    }
}

pub struct Pool {
    dialer: Box<dyn Dialer>,
    idle: Mutex<Vec<Box<dyn Connection>>>,
    max_idle: usize,
    closed: AtomicBool,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle_count())
            .field("max_idle", &self.max_idle)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Pool {
    pub fn new(dialer: impl Dialer, max_idle: usize) -> Self {
        Self {
            dialer: Box::new(dialer),
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            closed: AtomicBool::new(false),
        }
    }

    /// Check out a connection, reusing an idle one when available.
    pub async fn get(self: &Arc<Self>) -> RedisResult<PooledConnection> {
        if self.is_closed() {
            return Err(RedisError::from((
                ErrorKind::ClientError,
                "connection pool is closed",
            )));
        }

        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.dialer.dial().await?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            broken: false,
        })
    }

    /// Drop all idle connections; connections checked out later are
    /// discarded instead of returned.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn put(&self, conn: Box<dyn Connection>) {
        if self.is_closed() {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }
}

/// Connection checked out of a [`Pool`], returned on drop
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<Pool>,
    broken: bool,
}

impl PooledConnection {
    pub async fn execute(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        let conn = self.conn.as_mut().ok_or_else(|| {
            RedisError::from((ErrorKind::ClientError, "connection already released"))
        })?;
        let result = conn.execute(cmd).await;
        if let Err(err) = &result {
            // A dead socket must not go back into the idle list.
            if err.kind() == ErrorKind::IoError || err.is_connection_dropped() {
                self.broken = true;
            }
        }
        result
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !self.broken {
                self.pool.put(conn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct FakeConnection {
        fail: bool,
    }

    #[async_trait]
    impl Connection for FakeConnection {
        async fn execute(&mut self, _cmd: &Cmd) -> RedisResult<Value> {
            if self.fail {
                Err(RedisError::from((ErrorKind::IoError, "broken pipe")))
            } else {
                Ok(Value::Okay)
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingDialer {
        dials: Arc<AtomicUsize>,
        fail_commands: bool,
    }

    #[async_trait]
    impl Dialer for CountingDialer {
        async fn dial(&self) -> RedisResult<Box<dyn Connection>> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeConnection {
                fail: self.fail_commands,
            }))
        }
    }

    fn ping() -> Cmd {
        redis::cmd("PING")
    }

    #[tokio::test]
    async fn idle_connection_is_reused() {
        let dialer = CountingDialer::default();
        let pool = Arc::new(Pool::new(dialer.clone(), 1));

        for _ in 0..3 {
            let mut conn = pool.get().await.unwrap();
            conn.execute(&ping()).await.unwrap();
        }

        assert_eq!(dialer.dials.load(Ordering::SeqCst), 1);
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn idle_list_is_capped() {
        let dialer = CountingDialer::default();
        let pool = Arc::new(Pool::new(dialer.clone(), 1));

        let first = pool.get().await.unwrap();
        let second = pool.get().await.unwrap();
        drop(first);
        drop(second);

        assert_eq!(dialer.dials.load(Ordering::SeqCst), 2);
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn failed_connection_is_released_but_not_reused() {
        let dialer = CountingDialer {
            fail_commands: true,
            ..Default::default()
        };
        let pool = Arc::new(Pool::new(dialer.clone(), 2));

        {
            let mut conn = pool.get().await.unwrap();
            assert!(conn.execute(&ping()).await.is_err());
        }

        assert_eq!(pool.idle_count(), 0);
        pool.get().await.unwrap();
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn closed_pool_refuses_checkouts_and_drops_returns() {
        let pool = Arc::new(Pool::new(CountingDialer::default(), 1));
        let conn = pool.get().await.unwrap();

        pool.close();
        drop(conn);

        assert_eq!(pool.idle_count(), 0);
        assert!(pool.get().await.is_err());
    }
}
