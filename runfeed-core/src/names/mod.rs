//! Namespaced resource names.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

const SEPARATOR: char = '/';

/// The name of a K8s object, optionally qualified by its namespace.
///
/// Serialized as `namespace/name`, or just `name` when there is no namespace. A namespace
/// without a name can not be serialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub name: String,
    pub namespace: String,
}

impl NamespacedName {
    /// Create a new instance.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }

    /// Create a new instance without a namespace.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: String::new() }
    }

    /// True if both name and namespace are empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.namespace.is_empty()
    }

    /// `None` if this value is empty, else `Some(self)`.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Render this value using the given separator.
    pub fn to_separated_string(&self, separator: &str) -> Result<String, CoreError> {
        if self.namespace.is_empty() {
            return Ok(self.name.clone());
        }
        if self.name.is_empty() {
            return Err(CoreError::NamespaceWithoutName);
        }
        Ok(format!("{}{}{}", self.namespace, separator, self.name))
    }

    /// Render this value in its canonical `namespace/name` form.
    pub fn try_to_string(&self) -> Result<String, CoreError> {
        self.to_separated_string("/")
    }
}

impl FromStr for NamespacedName {
    type Err = CoreError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let mut splits = val.split(SEPARATOR);
        let (first, second) = match (splits.next(), splits.next(), splits.next()) {
            (_, None, _) => return Ok(Self::named(val)),
            (Some(first), Some(second), None) => (first, second),
            _ => return Err(CoreError::TooManySeparators),
        };
        if first.is_empty() || second.is_empty() {
            return Err(CoreError::EmptySegment);
        }
        Ok(Self::new(first, second))
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

impl Serialize for NamespacedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let val = self.try_to_string().map_err(S::Error::custom)?;
        serializer.serialize_str(&val)
    }
}

impl<'de> Deserialize<'de> for NamespacedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let val: String = Deserialize::deserialize(deserializer)?;
        val.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod mod_test;
