use std::{fmt, sync::LazyLock};

use bevy::reflect::Reflect;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Parameter;
use crate::errors::ParameterError;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_]\w*$").unwrap());

/// An identifier usable as part of a scene node name.
#[derive(Reflect, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn new(value: impl Into<String>) -> Result<Self, ParameterError> {
        let value = value.into();
        Self::check(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Parameter for Name {
    type Value = String;

    fn check(value: &String) -> Result<(), ParameterError> {
        if NAME_PATTERN.is_match(value) {
            Ok(())
        } else {
            Err(ParameterError::InvalidName(value.clone()))
        }
    }

    fn mirror(&self) -> Result<Self, ParameterError> {
        Ok(self.clone())
    }
}

impl TryFrom<String> for Name {
    type Error = ParameterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = ParameterError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
