//! Output artifact declarations.
//!
//! A run declares the artifacts it wants surfaced on completion with a path of the form
//! `component:artifact[:index][[filter]]`. The filter is a boolean expression evaluated against
//! the metadata of each produced artifact.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// The grammar of an artifact path.
pub const ARTIFACT_PATH_PATTERN: &str = r"^([^\[\]:]+):([^\[\]:]+)(?::(\d*))?(?:\[([^\[\]:]+)\])?$";

lazy_static! {
    static ref ARTIFACT_PATH_RE: Regex = Regex::new(ARTIFACT_PATH_PATTERN).expect("artifact path pattern must compile");
}

/// The position of an artifact within a run's component outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactLocator {
    pub component: String,
    pub artifact: String,
    pub index: usize,
}

impl fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.component, self.artifact, self.index)
    }
}

/// A locator plus an optional metadata filter expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactPath {
    pub locator: ArtifactLocator,
    pub filter: Option<String>,
}

impl FromStr for ArtifactPath {
    type Err = CoreError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let caps = ARTIFACT_PATH_RE.captures(val).ok_or_else(|| CoreError::InvalidArtifactPath(val.into()))?;
        let index = match caps.get(3).map(|m| m.as_str()).filter(|idx| !idx.is_empty()) {
            Some(idx) => idx.parse().map_err(|_| CoreError::InvalidArtifactPath(val.into()))?,
            None => 0,
        };
        Ok(Self {
            locator: ArtifactLocator {
                component: caps[1].to_string(),
                artifact: caps[2].to_string(),
                index,
            },
            filter: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}[{}]", self.locator, filter),
            None => write!(f, "{}", self.locator),
        }
    }
}

impl Serialize for ArtifactPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtifactPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let val: String = Deserialize::deserialize(deserializer)?;
        val.parse().map_err(D::Error::custom)
    }
}

impl JsonSchema for ArtifactPath {
    fn schema_name() -> String {
        "ArtifactPath".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                pattern: Some(ARTIFACT_PATH_PATTERN.into()),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

/// An artifact which a Run or RunConfiguration declares as one of its outputs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct OutputArtifact {
    /// The name under which the artifact is published.
    pub name: String,
    /// Where to find the artifact in the run's component outputs.
    pub path: ArtifactPath,
}
