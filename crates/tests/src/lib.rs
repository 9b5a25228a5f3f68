//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件 → Controller → drain → stop 全流程
//! - 多轮会话 (start/drain/stop 重复调用)
//! - 内置 driver 的端到端行为

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::path::Path;

    #[test]
    fn test_demo_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/grabber.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();

        let active: Vec<&str> = config.active_sources().map(|s| s.label.as_str()).collect();
        assert_eq!(active, vec!["imu", "camera", "gps_replay"]);
        assert_eq!(config.global.max_entries, 50);
        assert!(config.sources.iter().any(|s| s.label == "spare_lidar" && s.ignore));
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/grabber.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();

        let text = ConfigLoader::to_toml(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.global, config.global);
        assert_eq!(reloaded.sources, config.sources);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::thread;
    use std::time::{Duration, Instant};

    use acquisition::{Controller, SourceRegistry, WorkerExit, WorkerState};
    use contracts::{Record, RecordPayload, Timestamp};
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        done()
    }

    fn assert_oldest_first(records: &[Record]) {
        for pair in records.windows(2) {
            assert!(pair[0].timestamp() <= pair[1].timestamp());
        }
    }

    /// 配置文件 → start → drain → stop
    #[test]
    fn test_config_file_session() {
        let config = write_config(
            r#"
[global]
max_entries = 50
time_between_launches = 10
shutdown_grace_ms = 20
external_storage = false

[s1]
driver = "mock"
process_rate = 100.0

[s2]
driver = "mock"
process_rate = 50.0
records_per_poll = 2

[disabled]
driver = "mock"
process_rate = 10.0
grabber_ignore = true
"#,
        );

        let mut controller = Controller::new(SourceRegistry::default());
        let spawned = controller.start_from_path(config.path()).unwrap();
        assert_eq!(spawned, 2);
        assert_eq!(controller.settings().max_entries, 50);

        assert!(wait_until(Duration::from_secs(3), || {
            controller.buffer_stats().dropped_batches > 0
        }));
        let stats = controller.buffer_stats();
        assert!(stats.len <= 50);

        let drained = controller.drain();
        assert!(drained.len() >= 24);
        assert_oldest_first(&drained);

        let reports = controller.stop();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.exit == WorkerExit::Cancelled));
        assert!(controller.is_cancelled());
        assert!(controller.buffer_stats().len <= 50);
    }

    /// 同一个 Controller 连续两轮会话
    #[test]
    fn test_repeated_sessions() {
        let config = write_config(
            r#"
[global]
max_entries = 1000
time_between_launches = 0
shutdown_grace_ms = 10

[imu]
driver = "mock"
process_rate = 200.0
"#,
        );

        let mut controller = Controller::new(SourceRegistry::default());
        let mut previous_rawlog = None;

        for _ in 0..2 {
            controller.start_from_path(config.path()).unwrap();
            assert!(!controller.is_cancelled());

            let mut drained = 0;
            let deadline = Instant::now() + Duration::from_millis(200);
            while Instant::now() < deadline {
                drained += controller.drain().len();
                thread::sleep(Duration::from_millis(20));
            }
            assert!(drained > 0);

            let reports = controller.stop();
            assert_eq!(reports.len(), 1);
            assert!(reports[0].cycles > 0);
            assert!(controller.worker_states().is_empty());

            let session = controller.session().unwrap();
            assert!(session.rawlog_filename.ends_with(".rawlog"));
            previous_rawlog = Some(session.rawlog_filename.clone());
        }

        assert!(previous_rawlog.is_some());
        assert!(controller.stop().is_empty());
    }

    /// replay driver 经 Controller 输出文件中的记录
    #[test]
    fn test_replay_through_controller() {
        let mut recording = NamedTempFile::with_suffix(".jsonl").unwrap();
        for i in 0..10 {
            writeln!(
                recording,
                r#"{{"timestamp": {}.5, "payload": "line {}"}}"#,
                100 + i,
                i
            )
            .unwrap();
        }

        let config = write_config(&format!(
            r#"
[global]
max_entries = 100
time_between_launches = 0
shutdown_grace_ms = 10

[gps]
driver = "replay"
process_rate = 200.0
records_per_poll = 5
path = "{}"
"#,
            recording.path().display()
        ));

        let mut controller = Controller::new(SourceRegistry::default());
        controller.start_from_path(config.path()).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            controller.buffer_stats().inserted_records == 10
        }));

        let drained = controller.drain();
        assert_eq!(drained.len(), 5);
        assert_oldest_first(&drained);
        assert_eq!(drained[0].timestamp(), Timestamp::from_secs_f64(100.5));
        assert_eq!(drained[0].payload(), &RecordPayload::Text("line 0".into()));
        assert!(drained.iter().all(|r| r.source_key() == "gps"));

        controller.stop();
    }

    /// 一个数据源运行期故障 → 所有 worker 退出
    #[test]
    fn test_runtime_fault_cancels_all_sources() {
        let config = write_config(
            r#"
[global]
max_entries = 1000
time_between_launches = 0
shutdown_grace_ms = 10

[steady]
driver = "mock"
process_rate = 50.0

[flaky]
driver = "mock"
process_rate = 100.0
fail_after_polls = 3

[missing]
driver = "mock"
process_rate = 50.0
fail_init = true
"#,
        );

        let mut controller = Controller::new(SourceRegistry::default());
        controller.start_from_path(config.path()).unwrap();

        assert!(wait_until(Duration::from_secs(2), || !controller.is_running()));
        assert!(controller.is_cancelled());
        assert!(controller
            .worker_states()
            .iter()
            .all(|(_, state)| *state == WorkerState::Terminated));

        let reports = controller.stop();
        let exit = |label: &str| {
            reports
                .iter()
                .find(|r| r.label == label)
                .map(|r| r.exit.clone())
                .unwrap()
        };
        assert_eq!(exit("steady"), WorkerExit::Cancelled);
        assert!(matches!(exit("flaky"), WorkerExit::RuntimeFailed(_)));
        assert!(matches!(exit("missing"), WorkerExit::InitFailed(_)));
    }

    /// 非法全局配置拒绝整个文件，不启动任何 worker
    #[test]
    fn test_invalid_global_rejects_file() {
        let config = write_config(
            r#"
[global]
max_entries = 0

[imu]
driver = "mock"
process_rate = 100.0
"#,
        );

        let mut controller = Controller::new(SourceRegistry::default());
        let err = controller.start_from_path(config.path()).unwrap_err();
        assert!(err.to_string().contains("max_entries"));
        assert!(controller.worker_states().is_empty());
    }

    /// 宿主在异步运行时中通过 spawn_blocking 调用 start/stop
    #[tokio::test]
    async fn test_async_host_driver() {
        let config = write_config(
            r#"
[global]
max_entries = 200
time_between_launches = 0
shutdown_grace_ms = 10

[a]
driver = "mock"
process_rate = 100.0

[b]
driver = "mock"
process_rate = 100.0
"#,
        );
        let path = config.path().to_path_buf();

        let controller = tokio::task::spawn_blocking(move || {
            let mut controller = Controller::new(SourceRegistry::default());
            controller.start_from_path(&path).map(|_| controller)
        })
        .await
        .unwrap()
        .unwrap();

        let mut total = 0;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            total += controller.drain().len();
        }
        assert!(total > 0);

        let (controller, reports) = tokio::task::spawn_blocking(move || {
            let mut controller = controller;
            let reports = controller.stop();
            (controller, reports)
        })
        .await
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(!controller.is_running());
    }
}
