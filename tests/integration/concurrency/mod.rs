//! Concurrent writers against a file-backed store
//!
//! Every unit of work takes the write lock when it begins, so writers that
//! touch the same rows queue behind each other instead of failing.

use tokio::task::JoinHandle;
use vermgr_common::Result;
use vermgr_lifecycle::{DomainActivation, DomainPromotion, Environment, LifecycleStore};

use crate::common::TestApp;

const NAMES: [&str; 2] = ["web", "api"];

fn activation(name: &str, version: &str) -> DomainActivation {
    DomainActivation {
        name: name.to_string(),
        version: version.to_string(),
    }
}

fn promotion(name: &str, version: &str) -> DomainPromotion {
    DomainPromotion {
        name: name.to_string(),
        version: version.to_string(),
    }
}

async fn join_all(handles: Vec<JoinHandle<Result<()>>>) -> Vec<String> {
    let mut failures = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => failures.push(error.to_string()),
            Err(join_error) => failures.push(join_error.to_string()),
        }
    }
    failures
}

mod test_concurrent_writes {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_versions_of_one_image_all_commit() {
        let app = TestApp::file_backed().await.unwrap();
        app.engine.register_image("svc", "web").await.unwrap();
        app.engine.create_domain("web", "d0").await.unwrap();

        let handles = (0..40)
            .map(|n| {
                let engine = app.engine.clone();
                tokio::spawn(async move {
                    let version = format!("2025-01-01-00-00-{n:02}");
                    engine.create_image_version("svc", &version).await.map(|_| ())
                })
            })
            .collect();

        let failures = join_all(handles).await;
        assert!(failures.is_empty(), "{} failed: {:?}", failures.len(), failures.first());

        assert_eq!(app.engine.get_image("svc").await.unwrap().len(), 40);
        let d0 = app.domain("web", "d0").await;
        assert_eq!(
            d0.images.0.get("svc").map(|entry| entry.version.as_str()),
            Some("2025-01-01-00-00-39")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_create_activate_and_promote_keep_one_active_per_environment() {
        let app = TestApp::file_backed().await.unwrap();
        for name in NAMES {
            for v in 0..4 {
                app.engine.create_domain(name, &format!("d{v}")).await.unwrap();
            }
        }

        let mut handles: Vec<JoinHandle<Result<()>>> = Vec::new();
        for round in 0..6 {
            for name in NAMES {
                let engine: LifecycleStore = app.engine.clone();
                handles.push(tokio::spawn(async move {
                    engine
                        .create_domain(name, &format!("n{round}"))
                        .await
                        .map(|_| ())
                }));

                let engine = app.engine.clone();
                let version = format!("d{}", round % 4);
                handles.push(tokio::spawn(async move {
                    engine
                        .set_domains_active(&[activation(name, &version)])
                        .await
                        .map(|_| ())
                }));

                let engine = app.engine.clone();
                let version = format!("d{}", (round + 1) % 4);
                handles.push(tokio::spawn(async move {
                    engine
                        .promote_domains(&[promotion(name, &version)])
                        .await
                        .map(|_| ())
                }));
            }
        }

        let failures = join_all(handles).await;
        assert!(failures.is_empty(), "{} failed: {:?}", failures.len(), failures.first());

        assert!(app.duplicate_active_groups().await.unwrap().is_empty());
        for name in NAMES {
            assert_eq!(app.engine.get_domain(name).await.unwrap().len(), 10);
            for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
                assert!(app.active_count(name, env).await.unwrap() <= 1);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_promotions_of_one_version_reach_prod() {
        let app = TestApp::file_backed().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();

        let handles = (0..8)
            .map(|_| {
                let engine = app.engine.clone();
                tokio::spawn(async move {
                    engine
                        .promote_domains(&[promotion("web", "d1")])
                        .await
                        .map(|_| ())
                })
            })
            .collect();

        let failures = join_all(handles).await;
        assert!(failures.is_empty(), "{failures:?}");

        let d1 = app.domain("web", "d1").await;
        assert_eq!(d1.deployed, Environment::Prod);
        assert!(d1.active);
        assert!(d1.tested);
        assert!(app.duplicate_active_groups().await.unwrap().is_empty());
    }
}
