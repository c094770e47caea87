use thiserror::Error;

use super::GraphValidationError;
use crate::scene::{NodeKind, NodeRef, Plug};

/// Possible errors produced by scene construction and evaluation
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("No node exists for {0:?}")]
    UnknownNode(NodeRef),
    #[error("No node named {0:?} exists in the scene")]
    MissingNode(String),
    #[error("A node named {0:?} already exists in the scene")]
    NameCollision(String),
    #[error("{0:?} does not name an attribute of its node")]
    UnknownPlug(Plug),
    #[error("Attribute {1:?} already exists on {0:?}")]
    AttributeExists(NodeRef, String),
    #[error("No implementation registered for node kind {0:?}")]
    UnregisteredKind(NodeKind),
    #[error("{0:?} is not a transform")]
    NotATransform(NodeRef),
    #[error("Parenting {0:?} under {1:?} would create a hierarchy cycle")]
    HierarchyCycle(NodeRef, NodeRef),
    #[error("Dependency cycle detected while evaluating {0:?}")]
    Cycle(NodeRef),
    #[error("Node update did not produce output for {0:?}")]
    OutputMissing(Plug),
    #[error("Tried to convert to incorrect data type: expected {0}, got {1}")]
    MismatchedDataType(String, String),
    #[error(transparent)]
    Validation(#[from] GraphValidationError),
}

pub type SceneResult<T> = Result<T, SceneError>;
