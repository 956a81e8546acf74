//! Domain entities for the lifecycle engine
//!
//! Three tables back the engine: `images` (one row per image version),
//! `domains` (one row per domain version) and `image_domain` (one row per
//! image name, the authoritative record that the name exists).

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::snapshot::{DomainHistory, ImageList};
use super::state::{DeploymentState, DomainVersionState};

/// Promotion environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Convert to state machine state
    pub fn to_state(&self) -> DeploymentState {
        match self {
            Environment::Dev => DeploymentState::Dev,
            Environment::Staging => DeploymentState::Staging,
            Environment::Prod => DeploymentState::Prod,
        }
    }

    /// Create from state machine state
    pub fn from_state(state: DeploymentState) -> Self {
        match state {
            DeploymentState::Dev => Environment::Dev,
            DeploymentState::Staging => Environment::Staging,
            DeploymentState::Prod => Environment::Prod,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Dev => write!(f, "dev"),
            Environment::Staging => write!(f, "staging"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = vermgr_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            other => Err(vermgr_common::Error::Validation(format!(
                "Unknown environment '{other}', expected dev, staging or prod"
            ))),
        }
    }
}

/// One build of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub name: String,
    /// `YYYY-MM-DD-hh-mm-ss`; unique per name only
    pub version: String,
    /// Domain this version currently belongs to (soft reference)
    pub domain: String,
    pub tested: bool,
}

impl Image {
    /// A new, untested version assigned to `domain`
    pub fn new(name: impl Into<String>, version: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            domain: domain.into(),
            tested: false,
        }
    }
}

/// One version of a domain, pinning a snapshot of image versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub deployed: Environment,
    pub tested: bool,
    pub active: bool,
    pub images: Json<ImageList>,
}

impl Domain {
    /// A freshly created domain version: dev, active, untested
    pub fn new(name: impl Into<String>, version: impl Into<String>, images: ImageList) -> Self {
        let mut domain = Self {
            name: name.into(),
            version: version.into(),
            deployed: Environment::default(),
            tested: false,
            active: false,
            images: Json(images),
        };
        domain.apply_state(super::state::DeploymentStateMachine::initial());
        domain
    }

    /// Current lifecycle state
    pub fn state(&self) -> DomainVersionState {
        DomainVersionState {
            deployed: self.deployed.to_state(),
            active: self.active,
            tested: self.tested,
        }
    }

    /// Overwrite lifecycle columns from a state machine result
    pub fn apply_state(&mut self, state: DomainVersionState) {
        self.deployed = Environment::from_state(state.deployed);
        self.active = state.active;
        self.tested = state.tested;
    }

    /// `name:version` key used in logs and batch de-duplication
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

/// Current and historical domain assignment of an image name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageDomain {
    pub image: String,
    pub domain: String,
    pub domains: Json<DomainHistory>,
}

impl ImageDomain {
    pub fn new(image: impl Into<String>, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            image: image.into(),
            domains: Json(DomainHistory::starting_with(domain.clone())),
            domain,
        }
    }

    /// Point the image at `domain`, remembering it in the history
    pub fn reassign(&mut self, domain: &str) {
        self.domain = domain.to_string();
        self.domains.0.append_if_absent(domain);
    }
}
