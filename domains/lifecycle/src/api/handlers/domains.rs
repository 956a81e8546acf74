//! Domain API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;
use vermgr_common::{Error, Result, ValidatedBatch, ValidatedJson, ValidatedPath};

use super::NamePath;
use crate::api::middleware::LifecycleState;
use crate::domain::entities::{Domain, Environment};
use crate::domain::validation::{validate_domain_version, validate_name};
use crate::operations::{
    DomainActivation, DomainDeleted, DomainImagesUpdate, DomainPromotion, DomainTested,
    DomainVersionDeleted,
};

/// Optional environment filter
#[derive(Debug, Deserialize)]
pub struct EnvParams {
    pub env: Option<Environment>,
}

/// Request to create a domain version
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDomainRequest {
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
}

/// Request to rename a domain
#[derive(Debug, Deserialize, Validate)]
pub struct RenameDomainRequest {
    #[validate(custom(function = "validate_name"))]
    pub new_name: String,
}

/// `{name}/{version}` path segments of one domain version
#[derive(Debug, Deserialize, Validate)]
pub struct DomainVersionPath {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_domain_version"))]
    pub version: String,
}

/// List every domain version
pub async fn list_domains(State(state): State<LifecycleState>) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.list_domains().await?))
}

/// List active domain versions
pub async fn list_active_domains(
    State(state): State<LifecycleState>,
    Query(params): Query<EnvParams>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.list_active_domains(params.env).await?))
}

/// Get every version of one domain
pub async fn get_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
) -> Result<Json<Vec<Domain>>> {
    let domains = state.store.get_domain(&name).await?;
    if domains.is_empty() {
        return Err(Error::NotFound(format!("Domain {name} not found")));
    }
    Ok(Json(domains))
}

/// Get the active versions of one domain
pub async fn get_active_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    Query(params): Query<EnvParams>,
) -> Result<Json<Vec<Domain>>> {
    let domains = state.store.get_active_domain(&name, params.env).await?;
    if domains.is_empty() {
        return Err(Error::NotFound(match params.env {
            Some(env) => format!("No active version of domain {name} in {env}"),
            None => format!("No active version of domain {name}"),
        }));
    }
    Ok(Json(domains))
}

/// Create a domain version in dev
pub async fn create_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<CreateDomainRequest>,
) -> Result<(StatusCode, Json<Domain>)> {
    let domain = state.store.create_domain(&name, &req.version).await?;
    Ok((StatusCode::CREATED, Json(domain)))
}

/// Merge image references into domain versions
pub async fn update_domains(
    State(state): State<LifecycleState>,
    ValidatedBatch(updates): ValidatedBatch<DomainImagesUpdate>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.update_domains(&updates).await?))
}

/// Set tested flags on domain versions
pub async fn set_domains_tested(
    State(state): State<LifecycleState>,
    ValidatedBatch(items): ValidatedBatch<DomainTested>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.set_domains_tested(&items).await?))
}

/// Activate domain versions in their current environments
pub async fn set_domains_active(
    State(state): State<LifecycleState>,
    ValidatedBatch(items): ValidatedBatch<DomainActivation>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.set_domains_active(&items).await?))
}

/// Promote domain versions one environment forward
pub async fn promote_domains(
    State(state): State<LifecycleState>,
    ValidatedBatch(items): ValidatedBatch<DomainPromotion>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.promote_domains(&items).await?))
}

/// Rename a domain
pub async fn rename_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<RenameDomainRequest>,
) -> Result<Json<Vec<Domain>>> {
    Ok(Json(state.store.rename_domain(&name, &req.new_name).await?))
}

/// Delete every version of a domain
pub async fn delete_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
) -> Result<Json<DomainDeleted>> {
    Ok(Json(state.store.delete_domain(&name).await?))
}

/// Delete one domain version
pub async fn delete_domain_version(
    State(state): State<LifecycleState>,
    ValidatedPath(DomainVersionPath { name, version }): ValidatedPath<DomainVersionPath>,
) -> Result<Json<DomainVersionDeleted>> {
    Ok(Json(state.store.delete_domain_version(&name, &version).await?))
}
