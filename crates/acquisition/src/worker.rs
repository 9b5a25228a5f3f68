//! Acquisition worker
//!
//! One worker owns one source and runs on its own thread:
//! `Created → Initializing → Running → Stopping → Terminated`.
//! Errors never unwind past the worker boundary; a running-phase fault
//! raises the shared cancellation flag instead.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use contracts::{DataSource, SourceConfig, SourceError};
use tracing::{debug, error, info, trace, warn};

use crate::buffer::{InsertOutcome, SharedBuffer};
use crate::cancel::CancellationFlag;
use crate::error::{AcquisitionError, Result};
use crate::pacing::{CycleTiming, Pacer};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    Created = 0,
    Initializing = 1,
    Running = 2,
    Stopping = 3,
    Terminated = 4,
}

impl WorkerState {
    fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Created,
            1 => Self::Initializing,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Lock-free state cell shared between a worker and its handle
#[derive(Debug, Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WorkerState::Created as u8)))
    }

    pub fn get(&self) -> WorkerState {
        WorkerState::from_code(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Why a worker terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Observed the cancellation flag
    Cancelled,
    /// Missing or invalid configuration, never reached `Running`
    ConfigFailed(String),
    /// Device unavailable, never reached `Running`
    InitFailed(String),
    /// Poll failed while running; cancellation was raised
    RuntimeFailed(String),
    /// The source panicked; cancellation was raised
    Panicked(String),
}

impl WorkerExit {
    /// Whether the worker ended because of a fault
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Summary handed back when a worker is joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub label: String,
    /// Completed poll cycles
    pub cycles: u64,
    /// Records returned by the source
    pub records_collected: u64,
    pub batches_inserted: u64,
    pub batches_dropped: u64,
    pub records_dropped: u64,
    /// Cycles that took longer than the poll period
    pub overruns: u64,
    pub exit: WorkerExit,
}

impl WorkerReport {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            cycles: 0,
            records_collected: 0,
            batches_inserted: 0,
            batches_dropped: 0,
            records_dropped: 0,
            overruns: 0,
            exit: WorkerExit::Cancelled,
        }
    }
}

/// Resources shared by every worker of one session
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub buffer: Arc<SharedBuffer>,
    pub cancel: CancellationFlag,
    /// Directory for large external payloads, if enabled
    pub external_storage: Option<PathBuf>,
}

/// Polling worker (not yet spawned)
pub struct Worker {
    config: SourceConfig,
    source: Result<Box<dyn DataSource>>,
    context: WorkerContext,
    state: StateCell,
}

impl Worker {
    /// Create a worker for `config`
    ///
    /// `source` is the registry lookup result; a failed lookup is reported
    /// as a configuration error once the worker runs.
    pub fn new(
        config: SourceConfig,
        source: Result<Box<dyn DataSource>>,
        context: WorkerContext,
    ) -> Self {
        Self {
            config,
            source,
            context,
            state: StateCell::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    /// Start the worker on a dedicated thread named `acq-<label>`
    ///
    /// # Errors
    /// `SpawnFailed` if the OS refuses to create the thread.
    pub fn spawn(self) -> Result<WorkerHandle> {
        let label = self.config.label.clone();
        let state = self.state.clone();

        let thread = thread::Builder::new()
            .name(format!("acq-{label}"))
            .spawn(move || self.run())
            .map_err(|e| AcquisitionError::SpawnFailed {
                label: label.clone(),
                message: e.to_string(),
            })?;

        Ok(WorkerHandle {
            label,
            state,
            thread,
        })
    }

    /// Run to completion on the current thread
    pub fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport::new(&self.config.label);

        // 轮询阶段的 panic 在 run_inner 内处理，这里兜底 configure/initialize/shutdown
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_inner(&mut report)));
        if let Err(payload) = outcome {
            report.exit = self.panicked(payload.as_ref());
        }

        self.transition(WorkerState::Terminated);
        info!(
            label = %report.label,
            cycles = report.cycles,
            records = report.records_collected,
            dropped_batches = report.batches_dropped,
            exit = ?report.exit,
            "worker terminated"
        );
        report
    }

    fn run_inner(&mut self, report: &mut WorkerReport) {
        self.transition(WorkerState::Initializing);

        let (mut source, pacer) = match self.initialize() {
            Ok(ready) => ready,
            Err(exit) => {
                report.exit = exit;
                return;
            }
        };

        if self.context.cancel.is_raised() {
            debug!(label = %self.config.label, "cancelled before first cycle");
        } else {
            self.transition(WorkerState::Running);
            info!(
                label = %self.config.label,
                rate_hz = source.poll_rate_hz(),
                period_ms = pacer.period().as_secs_f64() * 1000.0,
                "worker running"
            );
            let polled = panic::catch_unwind(AssertUnwindSafe(|| {
                self.poll_loop(source.as_mut(), pacer, report)
            }));
            report.exit = match polled {
                Ok(exit) => exit,
                Err(payload) => self.panicked(payload.as_ref()),
            };
        }

        self.transition(WorkerState::Stopping);
        source.shutdown();
        debug!(label = %self.config.label, "source shut down");
    }

    /// Configure and open the source
    fn initialize(&mut self) -> std::result::Result<(Box<dyn DataSource>, Pacer), WorkerExit> {
        let label = self.config.label.clone();
        let placeholder = Err(AcquisitionError::UnknownDriver {
            label: label.clone(),
            driver: self.config.driver_kind.clone(),
        });

        let mut source = std::mem::replace(&mut self.source, placeholder).map_err(|e| {
            error!(label = %label, error = %e, "cannot create source");
            WorkerExit::ConfigFailed(e.to_string())
        })?;

        self.config
            .check()
            .and_then(|()| source.configure(&self.config))
            .map_err(|e| init_failure(&label, e))?;

        let rate_hz = source.poll_rate_hz();
        let pacer = Pacer::from_rate_hz(rate_hz).ok_or_else(|| {
            let e = SourceError::config(
                &label,
                format!("process_rate must be set to a valid value (>0 Hz), got {rate_hz}"),
            );
            init_failure(&label, e)
        })?;

        if let Some(path) = &self.context.external_storage {
            source.set_external_storage_path(path);
        }

        source.initialize().map_err(|e| init_failure(&label, e))?;
        Ok((source, pacer))
    }

    fn poll_loop(
        &self,
        source: &mut dyn DataSource,
        pacer: Pacer,
        report: &mut WorkerReport,
    ) -> WorkerExit {
        let label = self.config.label.as_str();

        loop {
            let cycle_start = Instant::now();

            if let Err(e) = source.poll() {
                error!(
                    label = %label,
                    error = %e,
                    "poll failed, signalling all workers to exit"
                );
                self.context.cancel.raise();
                return WorkerExit::RuntimeFailed(e.to_string());
            }

            let records = source.collect_new_records();
            report.cycles += 1;
            report.records_collected += records.len() as u64;

            match self.context.buffer.insert_batch(records) {
                InsertOutcome::Inserted { records, len } => {
                    report.batches_inserted += 1;
                    trace!(label = %label, records, buffer_len = len, "batch inserted");
                    observability::record_batch_inserted(label, records, len);
                }
                InsertOutcome::Dropped { records, len } => {
                    report.batches_dropped += 1;
                    report.records_dropped += records as u64;
                    debug!(
                        label = %label,
                        records,
                        buffer_len = len,
                        "buffer full, batch dropped"
                    );
                    observability::record_batch_dropped(label, records);
                }
                InsertOutcome::Empty => {}
            }

            if let CycleTiming::Overrun(overrun) = pacer.pace(cycle_start) {
                report.overruns += 1;
                trace!(
                    label = %label,
                    overrun_ms = overrun.as_secs_f64() * 1000.0,
                    "cycle exceeded poll period"
                );
                observability::record_cycle_overrun(label, overrun.as_secs_f64() * 1000.0);
            }

            if self.context.cancel.is_raised() {
                return WorkerExit::Cancelled;
            }
        }
    }

    fn panicked(&self, payload: &(dyn Any + Send)) -> WorkerExit {
        let message = panic_message(payload);
        error!(
            label = %self.config.label,
            panic = %message,
            "source panicked, signalling all workers to exit"
        );
        self.context.cancel.raise();
        WorkerExit::Panicked(message)
    }

    fn transition(&self, state: WorkerState) {
        self.state.set(state);
        observability::record_worker_state(&self.config.label, state as u8);
        debug!(label = %self.config.label, state = %state, "worker state changed");
    }
}

fn init_failure(label: &str, error: SourceError) -> WorkerExit {
    match error {
        SourceError::Config { .. } => {
            error!(label = %label, error = %error, "source configuration rejected");
            WorkerExit::ConfigFailed(error.to_string())
        }
        SourceError::Init { .. } | SourceError::Device { .. } => {
            error!(label = %label, error = %error, "source initialization failed");
            WorkerExit::InitFailed(error.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Controller-owned handle of a spawned worker
#[derive(Debug)]
pub struct WorkerHandle {
    label: String,
    state: StateCell,
    thread: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Block until the worker terminates
    pub fn join(self) -> WorkerReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(label = %self.label, panic = %message, "worker thread panicked");
                let mut report = WorkerReport::new(&self.label);
                report.exit = WorkerExit::Panicked(message);
                report
            }
        }
    }
}
