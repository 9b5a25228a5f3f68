//! Acquisition controller
//!
//! Owns one session's shared state: buffer, cancellation flag, worker
//! handles and session names. Lifecycle: `start` → (`drain`)* → `stop`,
//! repeatable on the same instance.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{AcquisitionConfig, GlobalSettings, Record, SourceConfig};
use tracing::{debug, error, info, instrument, warn};

use crate::buffer::SharedBuffer;
use crate::cancel::CancellationFlag;
use crate::error::{AcquisitionError, Result};
use crate::metrics::BufferStats;
use crate::registry::SourceRegistry;
use crate::session::SessionNaming;
use crate::worker::{Worker, WorkerContext, WorkerHandle, WorkerReport, WorkerState};

/// Multi-source acquisition controller
///
/// `start` and `stop` block the calling thread (stagger and join), hosts
/// with their own event loop should call them off the main line.
#[derive(Debug)]
pub struct Controller {
    registry: SourceRegistry,
    settings: GlobalSettings,
    buffer: Arc<SharedBuffer>,
    cancel: CancellationFlag,
    workers: Vec<WorkerHandle>,
    session: Option<SessionNaming>,
}

impl Controller {
    /// Controller with default global settings
    pub fn new(registry: SourceRegistry) -> Self {
        Self::with_settings(registry, GlobalSettings::default())
    }

    pub fn with_settings(registry: SourceRegistry, settings: GlobalSettings) -> Self {
        let buffer = Arc::new(SharedBuffer::new(settings.max_entries));
        Self {
            registry,
            settings,
            buffer,
            cancel: CancellationFlag::new(),
            workers: Vec::new(),
            session: None,
        }
    }

    /// Load a configuration file and start a session with its settings
    ///
    /// # Errors
    /// Parse/validation errors of the file, or `SessionActive`.
    #[instrument(name = "controller_start_from_path", skip(self, path), fields(path = %path.display()))]
    pub fn start_from_path(&mut self, path: &Path) -> Result<usize> {
        let config = ConfigLoader::load_from_path(path)?;
        self.start_with_config(&config)
    }

    /// Adopt the global settings of `config` and start its sources
    pub fn start_with_config(&mut self, config: &AcquisitionConfig) -> Result<usize> {
        self.ensure_stopped()?;
        self.settings = config.global.clone();
        let stagger = self.settings.launch_stagger();
        self.start(&config.sources, stagger)
    }

    /// Spawn one worker per launchable section
    ///
    /// Sections marked `grabber_ignore` and the `global` section are
    /// skipped. Waits `stagger` between two spawns. Returns the number of
    /// workers spawned without waiting for them to reach `Running`.
    ///
    /// Per-source configuration and init errors do not fail `start`, they
    /// terminate that worker only.
    ///
    /// # Errors
    /// `SessionActive` if the previous session was not stopped.
    #[instrument(name = "controller_start", skip(self, configs), fields(sections = configs.len()))]
    pub fn start(&mut self, configs: &[SourceConfig], stagger: Duration) -> Result<usize> {
        self.ensure_stopped()?;

        self.cancel.clear();
        self.buffer = Arc::new(SharedBuffer::new(self.settings.max_entries));

        let session = SessionNaming::now(&self.settings.rawlog_prefix);
        info!(
            rawlog = %session.rawlog_filename,
            external_storage = %session.external_storage_dir.display(),
            max_entries = self.settings.max_entries,
            "starting acquisition session"
        );

        let context = WorkerContext {
            buffer: self.buffer.clone(),
            cancel: self.cancel.clone(),
            external_storage: self
                .settings
                .external_storage
                .then(|| session.external_storage_dir.clone()),
        };
        self.session = Some(session);

        for (index, config) in configs.iter().filter(|c| c.is_launchable()).enumerate() {
            if index > 0 && !stagger.is_zero() {
                thread::sleep(stagger);
            }

            let source = self.registry.create(config);
            match Worker::new(config.clone(), source, context.clone()).spawn() {
                Ok(handle) => {
                    info!(label = %config.label, driver = %config.driver_kind, "worker launched");
                    self.workers.push(handle);
                }
                Err(e) => error!(label = %config.label, error = %e, "failed to launch worker"),
            }
        }

        for skipped in configs.iter().filter(|c| !c.is_launchable()) {
            debug!(label = %skipped.label, "section skipped");
        }

        info!(workers = self.workers.len(), "all workers launched");
        Ok(self.workers.len())
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.workers.is_empty() {
            Ok(())
        } else {
            Err(AcquisitionError::SessionActive {
                workers: self.workers.len(),
            })
        }
    }

    /// Hand off the oldest half of the buffer
    ///
    /// Never starts or stops workers; returns an empty vector when the
    /// buffer holds fewer than two entries.
    pub fn drain(&self) -> Vec<Record> {
        let records: Vec<Record> = self
            .buffer
            .drain_oldest_half()
            .into_iter()
            .map(|(_, record)| record)
            .collect();

        let remaining = self.buffer.len();
        observability::record_drain(records.len(), remaining);
        debug!(drained = records.len(), remaining, "buffer drained");
        records
    }

    /// Raise the cancellation flag and join every worker
    ///
    /// Blocks for the grace interval plus at most about one poll period
    /// per worker. Calling it again is a no-op apart from logging.
    #[instrument(name = "controller_stop", skip(self), fields(workers = self.workers.len()))]
    pub fn stop(&mut self) -> Vec<WorkerReport> {
        self.cancel.raise();

        if self.workers.is_empty() {
            info!("acquisition already stopped");
            return Vec::new();
        }

        info!("stopping acquisition");
        let grace = self.settings.shutdown_grace();
        if !grace.is_zero() {
            thread::sleep(grace);
        }

        let reports: Vec<WorkerReport> = self
            .workers
            .drain(..)
            .map(|handle| {
                debug!(label = %handle.label(), "joining worker");
                handle.join()
            })
            .collect();

        let failed = reports.iter().filter(|r| r.exit.is_failure()).count();
        if failed > 0 {
            warn!(workers = reports.len(), failed, "acquisition stopped with failed workers");
        } else {
            info!(workers = reports.len(), "acquisition stopped");
        }
        reports
    }

    /// `(label, state)` of every registered worker
    pub fn worker_states(&self) -> Vec<(String, WorkerState)> {
        self.workers
            .iter()
            .map(|w| (w.label().to_string(), w.state()))
            .collect()
    }

    /// Whether any registered worker has not terminated yet
    pub fn is_running(&self) -> bool {
        self.workers
            .iter()
            .any(|w| w.state() != WorkerState::Terminated)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_raised()
    }

    pub fn buffer_stats(&self) -> BufferStats {
        self.buffer.stats()
    }

    /// Names of the current (or last) session
    pub fn session(&self) -> Option<&SessionNaming> {
        self.session.as_ref()
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop();
        }
    }
}
