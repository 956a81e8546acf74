//! HTTP handlers for the Lifecycle domain

use serde::Deserialize;
use validator::Validate;

use crate::domain::validation::validate_name;

pub mod domains;
pub mod images;

/// `{name}` path segment, checked like names in request bodies
#[derive(Debug, Deserialize, Validate)]
pub struct NamePath {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
}
