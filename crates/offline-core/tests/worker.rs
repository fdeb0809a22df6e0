//! Worker lifecycle tests

mod common;

use std::sync::Arc;

use common::*;
use offline_core::*;

#[test]
fn test_worker_state_progression() {
    smol::block_on(async {
        let h = Harness::new();
        let mut worker = h.worker();
        assert_eq!(worker.state(), WorkerState::Parsed);

        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(worker.skip_waiting());
        assert!(!worker.controls_clients());

        worker.activate().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Activated);
        assert!(worker.controls_clients());
    });
}

#[test]
fn test_worker_does_not_intercept_before_activation() {
    smol::block_on(async {
        let h = Harness::new();
        let mut worker = h.worker();
        let form = Request::navigate(&scoped("form.html"));

        assert_eq!(worker.fetch(&form).await, FetchOutcome::Passthrough);
        worker.install().await.unwrap();
        let installs = h.fetcher.call_count();
        assert_eq!(worker.fetch(&form).await, FetchOutcome::Passthrough);
        assert_eq!(h.fetcher.call_count(), installs);

        worker.activate().await.unwrap();
        assert!(worker.fetch(&form).await.response().is_some());
    });
}

#[test]
fn test_worker_rejects_out_of_order_steps() {
    smol::block_on(async {
        let h = Harness::new();
        let mut worker = h.worker();

        let err = worker.activate().await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::InvalidState {
                expected: WorkerState::Installed,
                actual: WorkerState::Parsed,
            }
        ));

        worker.install().await.unwrap();
        assert!(worker.install().await.is_err());
    });
}

#[test]
fn test_worker_redundant_when_storage_fails() {
    smol::block_on(async {
        let fetcher = Arc::new(MockFetcher::new());
        let mut worker = OfflineWorker::builder(Arc::new(BrokenStorage), fetcher)
            .config(config())
            .sink(Arc::new(RecordingSink::new()))
            .build()
            .unwrap();

        assert!(matches!(worker.install().await, Err(WorkerError::Cache(_))));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert_eq!(worker.state().to_string(), "redundant");
    });
}

#[test]
fn test_worker_rejects_bad_scope() {
    let h = Harness::new();
    let config = CacheConfig {
        scope: "relative/".into(),
        ..Default::default()
    };
    let result = OfflineWorker::builder(h.storage.clone(), h.fetcher.clone())
        .config(config)
        .build();
    assert!(matches!(result, Err(WorkerError::Config(ConfigError::InvalidScope { .. }))));
}

#[test]
fn test_worker_serves_shell_offline_after_install() {
    smol::block_on(async {
        let h = Harness::new();
        h.storage.open("app-shell-v1").await.unwrap();
        let mut worker = h.worker();

        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["app-shell-v1"]);

        h.fetcher.set_offline(true);
        for path in ["", "index.html", "about.html", "style.css"] {
            let outcome = worker.fetch(&Request::get(&scoped(path))).await;
            assert_eq!(outcome.response().unwrap().status, 200, "{}", path);
        }

        let missing = worker.fetch(&Request::navigate(&scoped("calendar.html"))).await;
        assert!(missing.response().unwrap().text().contains("Sin conexión"));
    });
}
