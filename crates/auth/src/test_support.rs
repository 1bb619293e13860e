//! Fakes shared by this crate's unit tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use grantgate_core::UserId;

use crate::{Grant, GrantStore, PermissionKey, StoreError};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub(crate) fn key(s: &'static str) -> PermissionKey {
    PermissionKey::new(s).unwrap()
}

pub(crate) fn grant(user: i64, perm: &'static str) -> Grant {
    Grant::allow(UserId::new(user), key(perm), "registrar", now() - chrono::Duration::days(10))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Unavailable,
    MalformedRow,
    Panic,
    Hang,
}

/// In-memory store that counts calls and can be told to misbehave.
#[derive(Debug, Default)]
pub(crate) struct ScriptedStore {
    grants: Mutex<Vec<Grant>>,
    fault: Mutex<Option<Fault>>,
    user_calls: AtomicUsize,
    pair_calls: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn with_grants(grants: Vec<Grant>) -> Arc<Self> {
        Arc::new(Self {
            grants: Mutex::new(grants),
            ..Default::default()
        })
    }

    pub(crate) fn failing(fault: Fault) -> Arc<Self> {
        let store = Self::with_grants(Vec::new());
        store.set_fault(Some(fault));
        store
    }

    pub(crate) fn set_fault(&self, fault: Option<Fault>) {
        *self.fault.lock().unwrap() = fault;
    }

    pub(crate) fn remove(&self, user: i64, perm: &'static str) {
        let perm = key(perm);
        self.grants
            .lock()
            .unwrap()
            .retain(|g| !(g.user_id == UserId::new(user) && g.permission == perm));
    }

    pub(crate) fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn pair_calls(&self) -> usize {
        self.pair_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.user_calls() + self.pair_calls()
    }

    async fn misbehave(&self) -> Result<(), StoreError> {
        let fault = *self.fault.lock().unwrap();
        match fault {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(StoreError::Unavailable("connection refused".into())),
            Some(Fault::MalformedRow) => Err(StoreError::MalformedRow("permission_key is NULL".into())),
            Some(Fault::Panic) => panic!("grant adapter bug"),
            Some(Fault::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn rows(&self, user_id: UserId) -> Vec<Grant> {
        self.grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GrantStore for ScriptedStore {
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<Grant>, StoreError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.misbehave().await?;
        Ok(self.rows(user_id))
    }

    async fn grants_for_pair(
        &self,
        user_id: UserId,
        permission: &PermissionKey,
    ) -> Result<Vec<Grant>, StoreError> {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
        self.misbehave().await?;
        Ok(self
            .rows(user_id)
            .into_iter()
            .filter(|g| &g.permission == permission)
            .collect())
    }
}

/// JSON log lines captured from a thread-local subscriber.
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

pub(crate) struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}

impl CapturedLogs {
    /// Route this thread's events into a fresh buffer until the guard drops.
    /// Only reliable under a current-thread runtime.
    pub(crate) fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(logs.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub(crate) fn entries(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    pub(crate) fn count(&self, level: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e["level"] == level)
            .count()
    }

    pub(crate) fn audit_entries(&self) -> Vec<Value> {
        self.entries()
            .into_iter()
            .filter(|e| e["target"] == crate::gate::AUDIT_TARGET)
            .collect()
    }
}
