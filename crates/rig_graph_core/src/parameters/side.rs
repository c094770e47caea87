use std::fmt;

use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use super::Parameter;
use crate::errors::ParameterError;

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Side {
    L,
    R,
    C,
}

impl Side {
    /// Left and right swap. The center has no counterpart.
    pub fn mirrored(self) -> Option<Self> {
        match self {
            Self::L => Some(Self::R),
            Self::R => Some(Self::L),
            Self::C => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::R => "R",
            Self::C => "C",
        }
    }
}

impl Parameter for Side {
    type Value = String;

    fn check(value: &String) -> Result<(), ParameterError> {
        match value.as_str() {
            "L" | "R" | "C" => Ok(()),
            _ => Err(ParameterError::InvalidSide(value.clone())),
        }
    }

    fn mirror(&self) -> Result<Self, ParameterError> {
        self.mirrored()
            .ok_or_else(|| ParameterError::NotMirrorable(format!("side {self}")))
    }
}

impl TryFrom<String> for Side {
    type Error = ParameterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<&str> for Side {
    type Error = ParameterError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "L" => Ok(Self::L),
            "R" => Ok(Self::R),
            "C" => Ok(Self::C),
            _ => Err(ParameterError::InvalidSide(value.to_string())),
        }
    }
}

impl From<Side> for String {
    fn from(value: Side) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
