//! Serialized access to a [`HistoryIndex`] from any number of threads.
//!
//! One worker thread owns the index and applies commands in arrival order,
//! so no caller ever sees a half-applied mutation. Full scans run on a
//! separate builder thread; while one runs, searches return nothing and
//! mutations are queued, then replayed onto the new store before it goes live.
//!
//! ```
//! use urlindex::engine::HistoryIndex;
//! use urlindex::index::{HistoryEntry, IndexConfig, Row, VecSource};
//! use urlindex::service::IndexService;
//!
//! let service = IndexService::spawn(HistoryIndex::new(IndexConfig::default()));
//! let source: VecSource = std::iter::once(HistoryEntry {
//!     id: 1,
//!     row: Row::new("http://www.example.com/", "Example"),
//! })
//! .collect();
//!
//! let report = service.init(source, "en").unwrap().recv().unwrap();
//! assert_eq!(report.indexed, 1);
//! assert_eq!(service.search("exam").unwrap().len(), 1);
//! ```

pub mod protocol;
mod worker;

use crate::engine::HistoryIndex;
use crate::error::{IndexError, Result};
use crate::index::build::HistorySource;
use crate::index::types::{HistoryId, InitReport, Row, ScoredMatch};
use protocol::Command;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use worker::Worker;

pub use protocol::ServiceStatus;

/// Cloneable handle for sending commands to the worker
#[derive(Clone)]
pub struct IndexHandle {
    commands: Sender<Command>,
}

impl IndexHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| IndexError::ServiceStopped)
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = mpsc::channel();
        self.send(make(reply))?;
        response.recv().map_err(|_| IndexError::ServiceStopped)
    }

    /// Start a full scan. The returned receiver yields the report once the
    /// new store is live; it disconnects if a later `init` supersedes this one.
    pub fn init(
        &self,
        source: impl HistorySource + Send + 'static,
        languages: &str,
    ) -> Result<Receiver<InitReport>> {
        let (reply, report) = mpsc::channel();
        self.send(Command::Init {
            source: Box::new(source),
            languages: languages.to_owned(),
            reply,
        })?;
        Ok(report)
    }

    pub fn upsert(&self, id: HistoryId, row: Row) -> Result<()> {
        self.send(Command::Upsert { id, row })
    }

    pub fn delete(&self, id: HistoryId) -> Result<()> {
        self.send(Command::Delete { id })
    }

    pub fn search(&self, text: &str) -> Result<Vec<ScoredMatch>> {
        let text = text.to_owned();
        self.request(|reply| Command::Search { text, reply })
    }

    pub fn persist(&self) -> Result<Option<PathBuf>> {
        self.request(|reply| Command::Persist { reply })?
    }

    pub fn load(&self) -> Result<bool> {
        self.request(|reply| Command::Load { reply })?
    }

    pub fn status(&self) -> Result<ServiceStatus> {
        self.request(|reply| Command::Status { reply })
    }
}

/// Owner of the worker thread; stops and joins it on drop
pub struct IndexService {
    handle: IndexHandle,
    worker: Option<JoinHandle<()>>,
}

impl IndexService {
    pub fn spawn(index: HistoryIndex) -> Self {
        let (commands, receiver) = mpsc::channel();
        let worker = Worker::new(index, commands.clone());
        let thread = thread::Builder::new()
            .name("history-index".to_string())
            .spawn(move || worker.run(receiver))
            .ok();
        if thread.is_none() {
            tracing::error!("failed to spawn history index worker");
        }
        Self {
            handle: IndexHandle { commands },
            worker: thread,
        }
    }

    pub fn handle(&self) -> IndexHandle {
        self.handle.clone()
    }

    /// Stop the worker after it drains the commands already queued
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.send(Command::Shutdown);
            let _ = worker.join();
        }
    }
}

impl std::ops::Deref for IndexService {
    type Target = IndexHandle;

    fn deref(&self) -> &IndexHandle {
        &self.handle
    }
}

impl Drop for IndexService {
    fn drop(&mut self) {
        self.stop();
    }
}
