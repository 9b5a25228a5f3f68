//! Host driver loop.
//!
//! Controller calls that block (stagger, join) run on the blocking pool;
//! `drain` only takes the buffer lock and runs inline.

use std::future::Future;
use std::time::{Duration, Instant};

use acquisition::{Controller, SourceRegistry};
use anyhow::{Context, Result};
use contracts::AcquisitionConfig;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::RunStats;

/// Host loop configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Loaded configuration (overrides already applied)
    pub acquisition: AcquisitionConfig,

    /// Interval between two drains
    pub drain_interval: Duration,

    /// Length of each session (None = until shutdown)
    pub session_duration: Option<Duration>,

    /// Number of start/drain/stop rounds
    pub sessions: u32,
}

/// Drives a controller through one or more sessions
pub struct HostLoop {
    config: HostConfig,
    registry: SourceRegistry,
}

impl HostLoop {
    pub fn new(config: HostConfig) -> Self {
        Self::with_registry(config, SourceRegistry::default())
    }

    pub fn with_registry(config: HostConfig, registry: SourceRegistry) -> Self {
        Self { config, registry }
    }

    /// Run all sessions, returning early when `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let HostConfig {
            acquisition,
            drain_interval,
            session_duration,
            sessions,
        } = self.config;

        let started = Instant::now();
        let mut stats = RunStats::default();
        let mut controller = Controller::with_settings(self.registry, acquisition.global.clone());
        tokio::pin!(shutdown);

        for session in 1..=sessions {
            let config = acquisition.clone();
            let (returned, spawned) =
                blocking(controller, move |c| c.start_with_config(&config)).await?;
            controller = returned;
            let spawned = spawned.context("Failed to start acquisition session")?;

            info!(
                session,
                workers = spawned,
                rawlog = controller
                    .session()
                    .map(|s| s.rawlog_filename.as_str())
                    .unwrap_or_default(),
                "session started"
            );

            let session_end = async {
                match session_duration {
                    Some(duration) => tokio::time::sleep(duration).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(session_end);

            let mut ticker = tokio::time::interval(drain_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let records = controller.drain();
                        if !records.is_empty() {
                            debug!(
                                session,
                                records = records.len(),
                                first = %records[0].timestamp(),
                                "drained records"
                            );
                        }
                        stats.record_drain(&records);

                        if !controller.is_running() {
                            warn!(session, "all workers terminated, ending session");
                            break;
                        }
                    }
                    _ = &mut session_end => {
                        info!(session, "session duration reached");
                        break;
                    }
                    _ = &mut shutdown => {
                        warn!(session, "received shutdown signal, stopping acquisition");
                        stats.interrupted = true;
                        break;
                    }
                }
            }

            let (returned, reports) = blocking(controller, |c| c.stop()).await?;
            controller = returned;
            stats.record_session(reports, controller.buffer_stats());

            if stats.interrupted {
                break;
            }
        }

        stats.duration = started.elapsed();
        Ok(stats)
    }
}

/// Run a blocking controller call on the blocking pool
async fn blocking<T, F>(mut controller: Controller, f: F) -> Result<(Controller, T)>
where
    F: FnOnce(&mut Controller) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let output = f(&mut controller);
        (controller, output)
    })
    .await
    .context("Controller task panicked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GlobalSettings, SourceConfig};

    fn host_config(sources: Vec<SourceConfig>, sessions: u32) -> HostConfig {
        HostConfig {
            acquisition: AcquisitionConfig {
                global: GlobalSettings {
                    max_entries: 500,
                    launch_stagger_ms: 0,
                    shutdown_grace_ms: 10,
                    external_storage: false,
                    ..Default::default()
                },
                sources,
            },
            drain_interval: Duration::from_millis(20),
            session_duration: Some(Duration::from_millis(250)),
            sessions,
        }
    }

    #[tokio::test]
    async fn test_two_sessions_drain_records() {
        let config = host_config(
            vec![
                SourceConfig::new("imu", "mock", 100.0),
                SourceConfig::new("gps", "mock", 20.0),
            ],
            2,
        );
        let stats = HostLoop::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.sessions_completed, 2);
        assert!(!stats.interrupted);
        assert_eq!(stats.workers.len(), 4);
        assert_eq!(stats.failed_workers(), 0);
        assert!(stats.drains.total_records > 0);
        assert!(stats.drains.per_source.contains_key("imu"));
    }

    #[tokio::test]
    async fn test_shutdown_signal_ends_run() {
        let mut config = host_config(vec![SourceConfig::new("imu", "mock", 100.0)], 3);
        config.session_duration = None;

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let stats = HostLoop::new(config).run(shutdown).await.unwrap();

        assert!(stats.interrupted);
        assert_eq!(stats.sessions_completed, 1);
    }

    #[tokio::test]
    async fn test_session_ends_when_all_workers_fail() {
        let mut config = host_config(
            vec![SourceConfig::new("broken", "mock", 10.0).with_param("fail_init", true)],
            1,
        );
        config.session_duration = None;

        let stats = tokio::time::timeout(
            Duration::from_secs(5),
            HostLoop::new(config).run(std::future::pending()),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(stats.failed_workers(), 1);
        assert!(!stats.interrupted);
    }
}
