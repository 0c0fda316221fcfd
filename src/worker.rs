//! Off-thread snapshot creation.
//!
//! Walking a large tree can take a long time. [`SnapshotWorker`] runs the walk on a
//! dedicated compio worker thread so the calling runtime stays responsive, and hands back
//! only the finished result.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use compio::dispatcher::{Dispatcher, DispatcherBuilder};
use snafu::prelude::*;
use tracing::debug;

use crate::snapshot::{Snapshot, SnapshotCreationError, WalkOutcome};

pub struct SnapshotWorker {
    dispatcher: Dispatcher,
}

impl SnapshotWorker {
    pub fn new() -> Result<Self, WorkerCreationError> {
        let dispatcher = DispatcherBuilder::new()
            .worker_threads(NonZeroUsize::MIN)
            .build()
            .context(DispatcherSnafu)?;

        Ok(Self { dispatcher })
    }

    /// Runs [`Snapshot::create`] for `root` on the worker thread.
    pub async fn create(&self, root: PathBuf) -> Result<WalkOutcome, WorkerError> {
        debug!("Dispatching snapshot of {} to worker", root.display());
        let display_root = root.display().to_string();

        let receiver = self
            .dispatcher
            .dispatch(move || async move { Snapshot::create(&root) })
            .map_err(|e| WorkerError::DispatchError {
                root: display_root.clone(),
                error: e.to_string(),
            })?;

        receiver
            .await
            .context(CanceledSnafu {
                root: display_root,
            })?
            .context(CreationSnafu)
    }
}

#[derive(Debug, Snafu)]
pub enum WorkerCreationError {
    #[snafu(display("Failed to start snapshot worker"))]
    DispatcherError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum WorkerError {
    #[snafu(display("Failed to dispatch snapshot of {}: {}", root, error))]
    DispatchError { root: String, error: String },
    #[snafu(display("Snapshot of {} was canceled", root))]
    CanceledError {
        root: String,
        source: futures_channel::oneshot::Canceled,
    },
    #[snafu(display("Failed to take snapshot"))]
    CreationError { source: SnapshotCreationError },
}
