//! Image API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;
use vermgr_common::{Error, Result, ValidatedJson, ValidatedPath};

use super::NamePath;
use crate::api::middleware::LifecycleState;
use crate::domain::entities::{Image, ImageDomain};
use crate::domain::validation::{validate_name, validate_version};
use crate::operations::ImageDeleted;

/// Query parameters for tested filters; `tested` defaults to true
#[derive(Debug, Deserialize)]
pub struct TestedParams {
    pub tested: Option<bool>,
}

impl TestedParams {
    fn tested(&self) -> bool {
        self.tested.unwrap_or(true)
    }
}

/// Request to register an image name
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterImageRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_name"))]
    pub domain: String,
}

/// Request to create an image version
#[derive(Debug, Deserialize, Validate)]
pub struct CreateImageVersionRequest {
    #[validate(custom(function = "validate_version"))]
    pub version: String,
}

/// Request to record a test result
#[derive(Debug, Deserialize, Validate)]
pub struct SetImageTestedRequest {
    #[validate(custom(function = "validate_version"))]
    pub version: String,
    pub tested: bool,
}

/// Request to move an image to another domain
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateImageDomainRequest {
    #[validate(custom(function = "validate_name"))]
    pub domain: String,
}

/// Request to rename an image
#[derive(Debug, Deserialize, Validate)]
pub struct RenameImageRequest {
    #[validate(custom(function = "validate_name"))]
    pub new_name: String,
}

fn non_empty(images: Vec<Image>, what: impl FnOnce() -> String) -> Result<Json<Vec<Image>>> {
    if images.is_empty() {
        return Err(Error::NotFound(what()));
    }
    Ok(Json(images))
}

/// List every registered image name
pub async fn list_image_names(State(state): State<LifecycleState>) -> Result<Json<Vec<ImageDomain>>> {
    Ok(Json(state.store.list_image_names().await?))
}

/// List every image version
pub async fn list_image_versions(State(state): State<LifecycleState>) -> Result<Json<Vec<Image>>> {
    Ok(Json(state.store.list_image_versions().await?))
}

/// List image versions by tested flag
pub async fn list_tested_images(
    State(state): State<LifecycleState>,
    Query(params): Query<TestedParams>,
) -> Result<Json<Vec<Image>>> {
    Ok(Json(state.store.list_tested_images(params.tested()).await?))
}

/// Get every version of one image
pub async fn get_image(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
) -> Result<Json<Vec<Image>>> {
    let images = state.store.get_image(&name).await?;
    non_empty(images, || format!("Image {name} not found"))
}

/// Get versions of one image by tested flag
pub async fn get_tested_image(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    Query(params): Query<TestedParams>,
) -> Result<Json<Vec<Image>>> {
    let tested = params.tested();
    let images = state.store.get_tested_image(&name, tested).await?;
    non_empty(images, || format!("No versions of image {name} with tested={tested}"))
}

/// Register an image name under a domain
pub async fn register_image(
    State(state): State<LifecycleState>,
    ValidatedJson(req): ValidatedJson<RegisterImageRequest>,
) -> Result<(StatusCode, Json<ImageDomain>)> {
    let mapping = state.store.register_image(&req.name, &req.domain).await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

/// Create a new version of a registered image
pub async fn create_image_version(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<CreateImageVersionRequest>,
) -> Result<(StatusCode, Json<Image>)> {
    let image = state.store.create_image_version(&name, &req.version).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// Set the tested flag of one image version
pub async fn set_image_tested(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<SetImageTestedRequest>,
) -> Result<Json<Image>> {
    let image = state
        .store
        .set_image_tested(&name, &req.version, req.tested)
        .await?;
    Ok(Json(image))
}

/// Move an image to another domain
pub async fn update_image_domain(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<UpdateImageDomainRequest>,
) -> Result<Json<Vec<Image>>> {
    Ok(Json(state.store.update_image_domain(&name, &req.domain).await?))
}

/// Rename an image
pub async fn rename_image(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
    ValidatedJson(req): ValidatedJson<RenameImageRequest>,
) -> Result<Json<Vec<Image>>> {
    Ok(Json(state.store.rename_image(&name, &req.new_name).await?))
}

/// Delete an image with all its versions
pub async fn delete_image(
    State(state): State<LifecycleState>,
    ValidatedPath(NamePath { name }): ValidatedPath<NamePath>,
) -> Result<Json<ImageDeleted>> {
    Ok(Json(state.store.delete_image(&name).await?))
}
