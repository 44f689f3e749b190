// src/scheduler.rs
//! One-shot, in-process job scheduler. Nothing is persisted: pending jobs are
//! gone when the process exits.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobInfo {
    pub id: Uuid,
    pub name: String,
    pub run_at: DateTime<Utc>,
}

struct Entry {
    info: JobInfo,
    handle: JoinHandle<()>,
}

#[derive(Clone, Default)]
pub struct Scheduler {
    jobs: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` once, no earlier than `run_at`. Past times run immediately.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, name: impl Into<String>, run_at: DateTime<Utc>, job: F) -> Uuid
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let info = JobInfo {
            id,
            name: name.into(),
            run_at,
        };
        let jobs = Arc::clone(&self.jobs);

        // hold the lock across spawn so the task cannot deregister before it is registered
        let mut guard = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let task_name = info.name.clone();
        let handle = tokio::spawn(async move {
            sleep_until(run_at).await;
            jobs.lock().unwrap_or_else(|e| e.into_inner()).remove(&id);
            tracing::info!(job = %task_name, %id, "running scheduled job");
            job().await;
        });
        tracing::info!(job = %info.name, %id, %run_at, "scheduled job");
        guard.insert(id, Entry { info, handle });
        id
    }

    /// Pending jobs ordered by run time.
    pub fn jobs(&self) -> Vec<JobInfo> {
        let mut out: Vec<JobInfo> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|e| e.info.clone())
            .collect();
        out.sort_by(|a, b| a.run_at.cmp(&b.run_at).then(a.name.cmp(&b.name)));
        out
    }

    /// Returns false if the job already ran or never existed.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.jobs.lock().unwrap_or_else(|e| e.into_inner()).remove(&id) {
            Some(entry) => {
                entry.handle.abort();
                tracing::info!(job = %entry.info.name, %id, "cancelled job");
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let drained: Vec<Entry> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, e)| e)
            .collect();
        if !drained.is_empty() {
            tracing::warn!(dropped = drained.len(), "scheduler shutting down with pending jobs");
        }
        for entry in drained {
            entry.handle.abort();
        }
    }
}

// tokio timers are monotonic; re-check the wall clock so we never fire early.
async fn sleep_until(run_at: DateTime<Utc>) {
    loop {
        let remaining = (run_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            return;
        }
        tokio::time::sleep(remaining).await;
    }
}
