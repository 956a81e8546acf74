//! Route definitions for Lifecycle domain API

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::{domains, images};
use super::middleware::LifecycleState;

/// Create all Lifecycle domain API routes
pub fn routes() -> Router<LifecycleState> {
    Router::new()
        // Images
        .route("/v1/images/list", get(images::list_image_names))
        .route("/v1/images/list/versions", get(images::list_image_versions))
        .route("/v1/images/list/tested", get(images::list_tested_images))
        .route("/v1/images/create", post(images::register_image))
        .route("/v1/images/{name}", delete(images::delete_image))
        .route("/v1/images/{name}/list", get(images::get_image))
        .route(
            "/v1/images/{name}/tested",
            get(images::get_tested_image).put(images::set_image_tested),
        )
        .route("/v1/images/{name}/create", post(images::create_image_version))
        .route("/v1/images/{name}/domain", put(images::update_image_domain))
        .route("/v1/images/{name}/rename", put(images::rename_image))
        // Domains
        .route("/v1/domains/list", get(domains::list_domains))
        .route(
            "/v1/domains/active",
            get(domains::list_active_domains).put(domains::set_domains_active),
        )
        .route("/v1/domains/update", put(domains::update_domains))
        .route("/v1/domains/tested", put(domains::set_domains_tested))
        .route("/v1/domains/promote", put(domains::promote_domains))
        .route(
            "/v1/domains/{name}",
            get(domains::get_domain).delete(domains::delete_domain),
        )
        .route("/v1/domains/{name}/active", get(domains::get_active_domain))
        .route("/v1/domains/{name}/create", post(domains::create_domain))
        .route("/v1/domains/{name}/rename", put(domains::rename_domain))
        .route(
            "/v1/domains/{name}/{version}",
            delete(domains::delete_domain_version),
        )
}
