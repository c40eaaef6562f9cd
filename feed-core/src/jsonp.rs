//! Callback registry for JSON-in-script responses.
//!
//! Each request registers a uniquely named callback; the script body that comes
//! back (`name({...});`) is delivered to the registry, which resolves the
//! matching waiter once and forgets the name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::CallbackError;

static CALLBACK_INVOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(?:(?://[^\n]*\n|/\*.*?\*/)\s*)*([A-Za-z_$][\w$]*)\s*\((.*)\)\s*;?\s*$")
        .expect("valid callback regex")
});

type Waiters = Arc<Mutex<HashMap<String, oneshot::Sender<Value>>>>;

#[derive(Debug, Clone)]
pub struct CallbackRegistry {
    prefix: String,
    next_id: Arc<AtomicU64>,
    waiters: Waiters,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new("blg")
    }
}

impl CallbackRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: Arc::new(AtomicU64::new(1)),
            waiters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Allocates a fresh callback name and starts waiting on it.
    pub fn register(&self) -> PendingCallback {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}_{:x}", self.prefix, id);
        let (tx, rx) = oneshot::channel();
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.insert(name.clone(), tx);
        }
        PendingCallback {
            name,
            rx: Some(rx),
            waiters: self.waiters.clone(),
        }
    }

    /// Parses a script body and hands its payload to the named waiter.
    pub fn deliver(&self, script: &str) -> Result<(), CallbackError> {
        let caps = CALLBACK_INVOCATION
            .captures(script)
            .ok_or(CallbackError::Malformed)?;
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let payload: Value = serde_json::from_str(body)?;

        let sender = self
            .waiters
            .lock()
            .ok()
            .and_then(|mut waiters| waiters.remove(name))
            .ok_or_else(|| CallbackError::Unknown(name.to_string()))?;
        if sender.send(payload).is_err() {
            debug!(callback = name, "callback receiver already gone");
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.waiters.lock().map(|w| w.len()).unwrap_or(0)
    }
}

/// A registered callback. Dropping it unregisters the name.
#[derive(Debug)]
pub struct PendingCallback {
    name: String,
    rx: Option<oneshot::Receiver<Value>>,
    waiters: Waiters,
}

impl PendingCallback {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the payload; fires at most once.
    pub async fn wait(mut self, timeout: Duration) -> Result<Value, CallbackError> {
        let rx = self
            .rx
            .take()
            .ok_or_else(|| CallbackError::Dropped(self.name.clone()))?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CallbackError::Dropped(self.name.clone())),
            Err(_) => Err(CallbackError::TimedOut(self.name.clone())),
        }
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.remove(&self.name);
        }
    }
}
