//! Background CSV import.
//!
//! The worker owns its own database connection and a copy of the master
//! key, and talks to its owner only through `ImportEvent`s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::crypto::MasterKey;
use crate::errors::{LockboxError, Result};
use crate::repository::Repository;
use crate::store::Store;
use crate::vault::Vault;

use super::{CsvImporter, ImportOptions, ImportSummary};

/// Signals sent from the worker to its owner.
#[derive(Debug)]
pub enum ImportEvent {
    /// Total number of data rows; sent once before the first row.
    ProgressRange(usize),
    /// Rows processed so far.
    ProgressValue(usize),
    Finished(ImportSummary),
    Failed(LockboxError),
}

/// Owner's side of a running import.
pub struct ImportHandle {
    events: Receiver<ImportEvent>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ImportHandle {
    /// Ask the worker to stop before its next row.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Drain events until the terminal one, forwarding progress to
    /// `on_event`, and return the outcome.
    pub fn wait<F>(mut self, mut on_event: F) -> Result<ImportSummary>
    where
        F: FnMut(&ImportEvent),
    {
        let mut outcome = Err(LockboxError::CommandFailed(
            "import worker exited without a result".into(),
        ));
        for event in self.events.iter() {
            on_event(&event);
            match event {
                ImportEvent::Finished(summary) => {
                    outcome = Ok(summary);
                    break;
                }
                ImportEvent::Failed(err) => {
                    outcome = Err(err);
                    break;
                }
                _ => {}
            }
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("import worker panicked");
            }
        }
        outcome
    }
}

/// Start importing `data` on a background thread.
///
/// The worker opens a second connection to `store`'s file, so `store`
/// must be file-backed.
pub fn spawn_import(
    store: &Store,
    key: MasterKey,
    data: Vec<u8>,
    base_group_id: i64,
    options: ImportOptions,
) -> Result<ImportHandle> {
    let worker_store = store.reopen()?;
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let thread = thread::Builder::new()
        .name("lockbox-import".into())
        .spawn(move || {
            let vault = Vault::with_key(key);
            let repo = Repository::new(&worker_store, &vault);
            let mut importer = CsvImporter::new(&repo, base_group_id, options);

            // Sends only fail once the owner dropped the receiver.
            let result = importer.run(&data, &worker_cancel, |done, total| {
                if done == 0 {
                    let _ = tx.send(ImportEvent::ProgressRange(total));
                }
                let _ = tx.send(ImportEvent::ProgressValue(done));
            });
            let terminal = match result {
                Ok(summary) => ImportEvent::Finished(summary),
                Err(err) => {
                    tracing::warn!(error = %err, "background import failed");
                    ImportEvent::Failed(err)
                }
            };
            let _ = tx.send(terminal);
        })?;

    Ok(ImportHandle {
        events: rx,
        cancel,
        thread: Some(thread),
    })
}
