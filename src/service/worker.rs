use crate::engine::HistoryIndex;
use crate::index::build::build_store;
use crate::index::types::{IndexState, InitReport};
use crate::service::protocol::{Command, Mutation, ServiceStatus};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use tracing::{debug, info, warn};

/// State owned by the worker thread
pub(crate) struct Worker {
    index: HistoryIndex,
    /// Handle back into our own queue, for builder threads
    commands: Sender<Command>,
    generation: u64,
    pending: Vec<Mutation>,
    init_reply: Option<Sender<InitReport>>,
    searches_served: u64,
}

impl Worker {
    pub(crate) fn new(index: HistoryIndex, commands: Sender<Command>) -> Self {
        Self {
            index,
            commands,
            generation: 0,
            pending: Vec::new(),
            init_reply: None,
            searches_served: 0,
        }
    }

    /// Process commands until shutdown or until every sender is gone
    pub(crate) fn run(mut self, receiver: Receiver<Command>) {
        while let Ok(command) = receiver.recv() {
            if matches!(command, Command::Shutdown) {
                break;
            }
            self.handle(command);
        }
        debug!("index worker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Init {
                mut source,
                languages,
                reply,
            } => {
                self.generation += 1;
                let generation = self.generation;
                self.index.begin_init(&languages);
                // A new scan reads the source fresh; older queued edits are in it
                self.pending.clear();
                self.init_reply = Some(reply);

                let commands = self.commands.clone();
                let show_progress = self.index.show_progress();
                thread::spawn(move || {
                    let (store, report) = build_store(source.as_mut(), show_progress);
                    let _ = commands.send(Command::Built {
                        generation,
                        store,
                        report,
                    });
                });
            }
            Command::Built {
                generation,
                store,
                report,
            } => {
                if generation != self.generation {
                    debug!(generation, "discarding superseded index build");
                    return;
                }
                self.index.install(store);
                let replayed = self.pending.len();
                for mutation in self.pending.drain(..) {
                    match mutation {
                        Mutation::Upsert { id, row } => {
                            self.index.upsert(id, row);
                        }
                        Mutation::Delete { id } => {
                            self.index.delete(id);
                        }
                    }
                }
                info!(rows = report.indexed, replayed, "history index ready");
                if let Some(reply) = self.init_reply.take() {
                    let _ = reply.send(report);
                }
            }
            Command::Upsert { id, row } => {
                if self.index.state() == IndexState::Initializing {
                    self.pending.push(Mutation::Upsert { id, row });
                } else {
                    self.index.upsert(id, row);
                }
            }
            Command::Delete { id } => {
                if self.index.state() == IndexState::Initializing {
                    self.pending.push(Mutation::Delete { id });
                } else {
                    self.index.delete(id);
                }
            }
            Command::Search { text, reply } => {
                self.searches_served += 1;
                let _ = reply.send(self.index.search(&text));
            }
            Command::Persist { reply } => {
                let result = self.index.persist();
                if let Err(err) = &result {
                    warn!(error = %err, "failed to persist history index");
                }
                let _ = reply.send(result);
            }
            Command::Load { reply } => {
                let _ = reply.send(self.index.load());
            }
            Command::Status { reply } => {
                let _ = reply.send(ServiceStatus {
                    state: self.index.state(),
                    stats: self.index.stats(),
                    queued_mutations: self.pending.len(),
                    searches_served: self.searches_served,
                    last_counts: self.index.last_counts(),
                });
            }
            Command::Shutdown => {}
        }
    }
}
