use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use spaceguard::report::{self, human_size};
use spaceguard::snapshot::{CompareError, LoadError, SNAPSHOT_EXTENSION, SaveError};
use spaceguard::worker::{SnapshotWorker, WorkerCreationError, WorkerError};
use spaceguard::Snapshot;

use crate::application::RuntimeConfig;
use crate::cli::{Cli, Command};
use crate::config::{Settings, SettingsError};

pub struct Application;

impl Application {
    pub async fn run(cli: Cli) -> Result<(), ApplicationError> {
        let settings = Settings::read(&cli.config).await.context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);

        let config = RuntimeConfig::new(cli, settings);
        debug!("Runtime config: {:?}", config);
        report::configure_colors();

        match &config.command {
            Command::Save { output, root } => Self::save(root, output).await,
            Command::Compare {
                snapshot,
                root,
                update,
                ..
            } => Self::compare(&config, snapshot, root.as_deref(), *update).await,
            Command::Diff { old, new, .. } => Self::diff(&config, old, new).await,
            Command::Info { snapshot } => Self::info(snapshot).await,
        }
    }

    async fn save(root: &Path, output: &Path) -> Result<(), ApplicationError> {
        let output = with_snapshot_extension(output);
        let snapshot = Self::take_snapshot(root).await?;

        snapshot.save(&output).await.context(SaveSnapshotSnafu)?;
        println!(
            "Saved snapshot of {} ({}) to {}",
            snapshot.path().display(),
            human_size(snapshot.total_size()),
            output.display()
        );
        Ok(())
    }

    async fn compare(
        config: &RuntimeConfig,
        saved: &Path,
        root: Option<&Path>,
        update: bool,
    ) -> Result<(), ApplicationError> {
        let old = Snapshot::load(saved).await.context(LoadSnapshotSnafu)?;
        let root = root.unwrap_or(old.path()).to_path_buf();
        let new = Self::take_snapshot(&root).await?;

        Self::print_changes(config, &old, &new)?;

        if update {
            new.save(saved).await.context(SaveSnapshotSnafu)?;
            info!("Replaced {} with the current snapshot", saved.display());
        }
        Ok(())
    }

    async fn diff(config: &RuntimeConfig, old: &Path, new: &Path) -> Result<(), ApplicationError> {
        let old = Snapshot::load(old).await.context(LoadSnapshotSnafu)?;
        let new = Snapshot::load(new).await.context(LoadSnapshotSnafu)?;

        Self::print_changes(config, &old, &new)
    }

    async fn info(path: &Path) -> Result<(), ApplicationError> {
        let snapshot = Snapshot::load(path).await.context(LoadSnapshotSnafu)?;

        println!("Root:    {}", snapshot.path().display());
        println!("Size:    {}", human_size(snapshot.total_size()));
        println!("Entries: {}", snapshot.root().entry_count());
        Ok(())
    }

    async fn take_snapshot(root: &Path) -> Result<Snapshot, ApplicationError> {
        let worker = SnapshotWorker::new().context(WorkerStartSnafu)?;
        let outcome = worker
            .create(root.to_path_buf())
            .await
            .context(SnapshotSnafu)?;

        if !outcome.partial_failures.is_empty() {
            warn!(
                "{} entries could not be read and were counted as empty",
                outcome.partial_failures.len()
            );
        }
        Ok(outcome.into_snapshot())
    }

    fn print_changes(
        config: &RuntimeConfig,
        old: &Snapshot,
        new: &Snapshot,
    ) -> Result<(), ApplicationError> {
        let threshold = config.threshold.bytes();
        let changes = Snapshot::compare(old, new, threshold).context(ComparisonSnafu)?;
        info!("{} entries grew by at least {}", changes.len(), config.threshold);

        println!(
            "{}",
            report::render(new.path(), &changes, threshold, config.relative_paths)
        );
        Ok(())
    }
}

fn with_snapshot_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(SNAPSHOT_EXTENSION)
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("Critical failure encountered while starting the snapshot worker"))]
    WorkerStartError { source: WorkerCreationError },
    #[snafu(display("Critical failure encountered while taking a snapshot"))]
    SnapshotError { source: WorkerError },
    #[snafu(display("Critical failure encountered while saving a snapshot"))]
    SaveSnapshotError { source: SaveError },
    #[snafu(display("Critical failure encountered while loading a snapshot"))]
    LoadSnapshotError { source: LoadError },
    #[snafu(display("Critical failure encountered while comparing snapshots"))]
    ComparisonError { source: CompareError },
}
