//! Plan document: what to provision and where
//!
//! The plan is a YAML file. Loading it also validates it, so everything past
//! [`load_plan`] can rely on well-formed secret declarations.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};
use std::fmt;
use std::path::{Path, PathBuf};

lazy_static! {
    /// RFC 1123 label, which Kubernetes enforces for namespaces and secret names
    static ref DNS_LABEL: Regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap();
}

/// Target orchestration backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orchestration {
    Kubernetes,
    Swarm,
}

impl fmt::Display for Orchestration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orchestration::Kubernetes => write!(f, "Kubernetes"),
            Orchestration::Swarm => write!(f, "Swarm"),
        }
    }
}

/// One secret to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSpec {
    pub name: String,
    /// Only meaningful on Kubernetes
    #[serde(default)]
    pub namespace: Option<String>,
    /// Key inside a Kubernetes generic secret, defaults to `name`
    #[serde(default)]
    pub key: Option<String>,
}

impl SecretSpec {
    pub fn literal_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub orchestration: Orchestration,
    #[serde(default)]
    pub secrets: Vec<SecretSpec>,
    #[serde(default)]
    pub root_domain: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub tls: bool,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PlanLoadError {
    #[snafu(display("failed to read plan {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse plan {}: {source}", path.display()))]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("invalid plan: {message}"))]
    Invalid { message: String },
}

impl Plan {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Check secret declarations against what the backend accepts
    pub fn validate(&self) -> Result<(), PlanLoadError> {
        for (index, secret) in self.secrets.iter().enumerate() {
            ensure!(
                !secret.name.trim().is_empty(),
                InvalidSnafu {
                    message: format!("secrets[{index}] has an empty name"),
                }
            );

            if self.orchestration == Orchestration::Kubernetes {
                ensure!(
                    DNS_LABEL.is_match(&secret.name),
                    InvalidSnafu {
                        message: format!(
                            "secret name '{}' is not a valid Kubernetes name",
                            secret.name
                        ),
                    }
                );

                let namespace = secret.namespace.as_deref().unwrap_or("");
                ensure!(
                    !namespace.is_empty(),
                    InvalidSnafu {
                        message: format!("secret '{}' needs a namespace on Kubernetes", secret.name),
                    }
                );
                ensure!(
                    DNS_LABEL.is_match(namespace),
                    InvalidSnafu {
                        message: format!("namespace '{namespace}' is not a valid Kubernetes name"),
                    }
                );
            }
        }

        Ok(())
    }
}

/// Read, parse and validate a plan file
pub fn load_plan(path: &Path) -> Result<Plan, PlanLoadError> {
    let content = std::fs::read_to_string(path).context(ReadSnafu { path })?;
    let plan = Plan::from_yaml(&content).context(ParseSnafu { path })?;
    plan.validate()?;
    Ok(plan)
}
