#![allow(dead_code)]

use kiqueue::{async_trait, Connection, Dialer};
use redis::{Arg, Cmd, ErrorKind, RedisError, RedisResult, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

/// In-memory stand-in for Redis that records every command it applies
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    failing: Arc<AtomicBool>,
    dials: Arc<AtomicUsize>,
}

#[derive(Default)]
struct State {
    commands: Vec<Vec<String>>,
    lists: HashMap<String, Vec<String>>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command fail with an I/O error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn commands_named(&self, name: &str) -> Vec<Vec<String>> {
        self.commands()
            .into_iter()
            .filter(|c| c[0].eq_ignore_ascii_case(name))
            .collect()
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .lists
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_members(&self, key: &str) -> BTreeSet<String> {
        self.state
            .lock()
            .unwrap()
            .sets
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn apply(&self, args: Vec<String>) -> RedisResult<Value> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RedisError::from((ErrorKind::IoError, "connection refused")));
        }

        let mut state = self.state.lock().unwrap();
        state.commands.push(args.clone());
        match args[0].to_ascii_uppercase().as_str() {
            "RPUSH" => {
                let list = state.lists.entry(args[1].clone()).or_default();
                list.extend(args[2..].iter().cloned());
                Ok(Value::Int(list.len() as i64))
            }
            "SADD" => {
                let set = state.sets.entry(args[1].clone()).or_default();
                let added = args[2..].iter().filter(|m| set.insert((*m).clone())).count();
                Ok(Value::Int(added as i64))
            }
            _ => Ok(Value::Okay),
        }
    }
}

struct MemoryConnection {
    store: MemoryStore,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn execute(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        let args = cmd
            .args_iter()
            .filter_map(|arg| match arg {
                Arg::Simple(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                Arg::Cursor => None,
            })
            .collect();
        self.store.apply(args)
    }
}

#[async_trait]
impl Dialer for MemoryStore {
    async fn dial(&self) -> RedisResult<Box<dyn Connection>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            store: self.clone(),
        }))
    }
}
