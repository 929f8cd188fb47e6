//! Messages exchanged with the index worker thread.

use crate::error::Result;
use crate::index::build::HistorySource;
use crate::index::store::{IndexStats, Store};
use crate::index::types::{HistoryId, IndexState, InitReport, Row, ScoredMatch, SearchCounts};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// Commands processed, one at a time, by the worker
pub(crate) enum Command {
    Init {
        source: Box<dyn HistorySource + Send>,
        languages: String,
        reply: Sender<InitReport>,
    },
    /// Sent by the builder thread when a full scan finishes
    Built {
        generation: u64,
        store: Store,
        report: InitReport,
    },
    Upsert {
        id: HistoryId,
        row: Row,
    },
    Delete {
        id: HistoryId,
    },
    Search {
        text: String,
        reply: Sender<Vec<ScoredMatch>>,
    },
    Persist {
        reply: Sender<Result<Option<PathBuf>>>,
    },
    Load {
        reply: Sender<Result<bool>>,
    },
    Status {
        reply: Sender<ServiceStatus>,
    },
    Shutdown,
}

/// A mutation held back while a full scan is running
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Upsert { id: HistoryId, row: Row },
    Delete { id: HistoryId },
}

/// Snapshot of the worker's state
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub state: IndexState,
    pub stats: IndexStats,
    /// Mutations waiting for the running scan to finish
    pub queued_mutations: usize,
    pub searches_served: u64,
    pub last_counts: SearchCounts,
}
