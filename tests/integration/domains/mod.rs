//! Domain operation and promotion tests

use vermgr_common::Error;
use vermgr_lifecycle::{
    DomainActivation, DomainImagesUpdate, DomainPromotion, DomainTested, Environment, ImageRef,
    ImageSnapshot,
};

use crate::common::{snapshot_names, TestApp, V1, V2};

fn promotion(name: &str, version: &str) -> DomainPromotion {
    DomainPromotion {
        name: name.to_string(),
        version: version.to_string(),
    }
}

fn activation(name: &str, version: &str) -> DomainActivation {
    DomainActivation {
        name: name.to_string(),
        version: version.to_string(),
    }
}

mod test_create {
    use super::*;

    #[tokio::test]
    async fn test_create_snapshots_latest_version_per_image() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V2, V1]).await.unwrap();
        app.seed_image("api", "web", &[V1]).await.unwrap();
        app.seed_image("other", "elsewhere", &[V2]).await.unwrap();
        app.engine.set_image_tested("api", V1, true).await.unwrap();

        let domain = app.engine.create_domain("web", "d1").await.unwrap();

        assert_eq!(domain.deployed, Environment::Dev);
        assert!(domain.active);
        assert!(!domain.tested);
        assert_eq!(
            domain.images.0.entries(),
            &[
                ImageSnapshot::new("api", V1, true),
                ImageSnapshot::new("svc", V2, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_with_no_assigned_images_has_empty_snapshot() {
        let app = TestApp::new().await.unwrap();

        let domain = app.engine.create_domain("web", "d1").await.unwrap();
        assert!(domain.images.0.is_empty());
    }

    #[tokio::test]
    async fn test_create_deactivates_previous_dev_version_only() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        app.engine.create_domain("web", "d3").await.unwrap();

        assert!(app.domain("web", "d1").await.active, "staging version untouched");
        assert!(!app.domain("web", "d2").await.active);
        assert!(app.domain("web", "d3").await.active);
        assert_eq!(app.active_count("web", Environment::Dev).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_existing_version_conflicts() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        let err = app.engine.create_domain("web", "d1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(app.domain("web", "d2").await.active);
    }
}

mod test_update_images {
    use super::*;

    #[tokio::test]
    async fn test_update_merges_by_name_with_current_tested_flag() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();
        app.seed_image("api", "web", &[V1]).await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.seed_image("worker", "batch", &[V1, V2]).await.unwrap();
        app.engine.set_image_tested("worker", V2, true).await.unwrap();
        app.engine.create_image_version("svc", V2).await.unwrap();

        let updated = app
            .engine
            .update_domains(&[DomainImagesUpdate {
                name: "web".to_string(),
                version: "d1".to_string(),
                images: vec![
                    ImageRef::new("worker", V1),
                    ImageRef::new("worker", V2),
                    ImageRef::new("ghost", V1),
                ],
            }])
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(
            updated[0].images.0.entries(),
            &[
                ImageSnapshot::new("api", V1, false),
                // merged in by create_image_version, untouched by the update
                ImageSnapshot::new("svc", V2, false),
                ImageSnapshot::new("worker", V2, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_skips_unknown_domains() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();

        let updated = app
            .engine
            .update_domains(&[
                DomainImagesUpdate {
                    name: "web".to_string(),
                    version: "missing".to_string(),
                    images: vec![ImageRef::new("svc", V1)],
                },
                DomainImagesUpdate {
                    name: "web".to_string(),
                    version: "d1".to_string(),
                    images: vec![],
                },
            ])
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].version, "d1");
        assert_eq!(snapshot_names(&updated[0]), vec!["svc"]);
    }
}

mod test_tested {
    use super::*;

    #[tokio::test]
    async fn test_set_domains_tested_updates_column_only() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();

        let updated = app
            .engine
            .set_domains_tested(&[
                DomainTested {
                    name: "web".to_string(),
                    version: "d1".to_string(),
                    tested: true,
                },
                DomainTested {
                    name: "web".to_string(),
                    version: "nope".to_string(),
                    tested: true,
                },
            ])
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert!(updated[0].tested);
        assert!(updated[0].active);
        assert!(!updated[0].images.0.get("svc").unwrap().tested);
    }
}

mod test_active {
    use super::*;

    #[tokio::test]
    async fn test_activate_switches_active_version_within_environment() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        let rows = app.engine.set_domains_active(&[activation("web", "d1")]).await.unwrap();

        assert_eq!(rows.len(), 2);
        let active: Vec<_> = rows.iter().filter(|d| d.active).map(|d| d.version.as_str()).collect();
        assert_eq!(active, vec!["d1"]);
        assert_eq!(app.active_count("web", Environment::Dev).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activate_leaves_other_environments_alone() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();
        app.engine.create_domain("web", "d3").await.unwrap();

        app.engine.set_domains_active(&[activation("web", "d2")]).await.unwrap();

        assert!(app.domain("web", "d1").await.active);
        assert!(app.domain("web", "d2").await.active);
        assert!(!app.domain("web", "d3").await.active);
    }

    #[tokio::test]
    async fn test_activate_batch_with_two_versions_in_one_group_keeps_last() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();
        app.engine.create_domain("web", "d3").await.unwrap();

        app.engine
            .set_domains_active(&[activation("web", "d1"), activation("web", "d2")])
            .await
            .unwrap();

        assert!(!app.domain("web", "d1").await.active);
        assert!(app.domain("web", "d2").await.active);
        assert!(!app.domain("web", "d3").await.active);
    }

    #[tokio::test]
    async fn test_activate_batch_across_domains() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();
        app.engine.create_domain("api", "a1").await.unwrap();
        app.engine.create_domain("api", "a2").await.unwrap();

        let rows = app
            .engine
            .set_domains_active(&[activation("web", "d1"), activation("api", "a1"), activation("api", "zzz")])
            .await
            .unwrap();

        assert_eq!(rows.len(), 4);
        assert!(app.domain("web", "d1").await.active);
        assert!(app.domain("api", "a1").await.active);
        assert!(app.duplicate_active_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_active_domains_filters_by_environment() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();
        app.engine.create_domain("api", "a1").await.unwrap();

        let all = app.engine.list_active_domains(None).await.unwrap();
        let staging = app
            .engine
            .list_active_domains(Some(Environment::Staging))
            .await
            .unwrap();
        let web_dev = app
            .engine
            .get_active_domain("web", Some(Environment::Dev))
            .await
            .unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(staging.len(), 1);
        assert_eq!(staging[0].version, "d1");
        assert_eq!(web_dev.len(), 1);
        assert_eq!(web_dev[0].version, "d2");
    }
}

mod test_promote {
    use super::*;

    #[tokio::test]
    async fn test_promotion_path_dev_staging_prod() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine
            .set_domains_tested(&[DomainTested {
                name: "web".to_string(),
                version: "d1".to_string(),
                tested: true,
            }])
            .await
            .unwrap();

        let staged = app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        assert_eq!(staged[0].deployed, Environment::Staging);
        assert!(!staged[0].tested, "staging requires re-validation");
        assert!(staged[0].active);

        let prod = app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        assert_eq!(prod[0].deployed, Environment::Prod);
        assert!(prod[0].tested);
        assert!(prod[0].active);

        let again = app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        assert_eq!(again[0].deployed, Environment::Prod);
        assert!(again[0].tested);
        assert!(again[0].active);
    }

    #[tokio::test]
    async fn test_promotion_replaces_active_version_in_target_environment() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        app.engine.promote_domains(&[promotion("web", "d2")]).await.unwrap();

        let d1 = app.domain("web", "d1").await;
        let d2 = app.domain("web", "d2").await;
        assert_eq!(d1.deployed, Environment::Staging);
        assert!(!d1.active);
        assert_eq!(d2.deployed, Environment::Staging);
        assert!(d2.active);
        assert_eq!(app.active_count("web", Environment::Staging).await.unwrap(), 1);
        assert_eq!(app.active_count("web", Environment::Dev).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_promotion_reactivates_inactive_prod_version() {
        let app = TestApp::new().await.unwrap();
        for version in ["d1", "d2"] {
            app.engine.create_domain("web", version).await.unwrap();
            app.engine.promote_domains(&[promotion("web", version)]).await.unwrap();
            app.engine.promote_domains(&[promotion("web", version)]).await.unwrap();
        }
        assert!(!app.domain("web", "d1").await.active);

        app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();

        assert!(app.domain("web", "d1").await.active);
        assert!(!app.domain("web", "d2").await.active);
    }

    #[tokio::test]
    async fn test_promotion_batch_applies_targets_in_order() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("api", "a1").await.unwrap();

        let rows = app
            .engine
            .promote_domains(&[
                promotion("web", "d1"),
                promotion("missing", "x"),
                promotion("api", "a1"),
                promotion("web", "d1"),
            ])
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(app.domain("web", "d1").await.deployed, Environment::Prod);
        assert_eq!(app.domain("api", "a1").await.deployed, Environment::Staging);
    }

    #[tokio::test]
    async fn test_promotion_unknown_target_returns_empty() {
        let app = TestApp::new().await.unwrap();

        let rows = app.engine.promote_domains(&[promotion("web", "d1")]).await.unwrap();
        assert!(rows.is_empty());
    }
}

mod test_rename {
    use super::*;

    #[tokio::test]
    async fn test_rename_domain_repoints_images_and_mappings() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1, V2]).await.unwrap();
        app.seed_image("other", "api", &[V1]).await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        let renamed = app.engine.rename_domain("web", "frontend").await.unwrap();

        assert_eq!(renamed.len(), 2);
        assert!(renamed.iter().all(|d| d.name == "frontend"));
        assert!(app.engine.get_domain("web").await.unwrap().is_empty());

        let mapping = app.engine.get_image_domain("svc").await.unwrap().unwrap();
        assert_eq!(mapping.domain, "frontend");
        assert_eq!(
            mapping.domains.0.entries(),
            &["web".to_string(), "frontend".to_string()]
        );
        assert!(app
            .engine
            .get_image("svc")
            .await
            .unwrap()
            .iter()
            .all(|image| image.domain == "frontend"));

        let untouched = app.engine.get_image_domain("other").await.unwrap().unwrap();
        assert_eq!(untouched.domain, "api");
    }

    #[tokio::test]
    async fn test_rename_keeps_dev_auto_propagation_working() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.rename_domain("web", "frontend").await.unwrap();

        app.engine.create_image_version("svc", V2).await.unwrap();

        let d1 = app.domain("frontend", "d1").await;
        assert_eq!(d1.images.0.get("svc").unwrap().version, V2);
    }

    #[tokio::test]
    async fn test_rename_unknown_domain_is_not_found() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();

        let err = app.engine.rename_domain("web", "frontend").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let mapping = app.engine.get_image_domain("svc").await.unwrap().unwrap();
        assert_eq!(mapping.domain, "web", "nothing committed");
    }

    #[tokio::test]
    async fn test_rename_onto_existing_domain_conflicts() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("api", "a1").await.unwrap();

        let err = app.engine.rename_domain("web", "api").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}

mod test_delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_domain_version() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        let deleted = app.engine.delete_domain_version("web", "d1").await.unwrap();

        assert!(deleted.deleted);
        assert_eq!((deleted.name.as_str(), deleted.version.as_str()), ("web", "d1"));
        let remaining = app.engine.get_domain("web").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].version, "d2");
    }

    #[tokio::test]
    async fn test_delete_unknown_domain_version_is_not_found() {
        let app = TestApp::new().await.unwrap();

        let err = app.engine.delete_domain_version("web", "d1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_domain_in_use_conflicts_with_count() {
        let app = TestApp::new().await.unwrap();
        app.seed_image("svc", "web", &[V1]).await.unwrap();
        app.engine.register_image("api", "web").await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();

        let err = app.engine.delete_domain("web").await.unwrap_err();
        match err {
            Error::Conflict(message) => assert!(message.contains("2 images"), "{message}"),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(app.engine.get_domain("web").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_domain_removes_all_versions() {
        let app = TestApp::new().await.unwrap();
        app.engine.create_domain("web", "d1").await.unwrap();
        app.engine.create_domain("web", "d2").await.unwrap();

        let deleted = app.engine.delete_domain("web").await.unwrap();

        assert!(deleted.deleted);
        assert_eq!(deleted.versions_removed, 2);
        assert!(app.engine.get_domain("web").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_domain_is_not_found() {
        let app = TestApp::new().await.unwrap();

        let err = app.engine.delete_domain("web").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
