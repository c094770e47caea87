use rig_graph_core::errors::{ParameterError, SceneError};
use thiserror::Error;

use crate::component::StorageKind;

/// Possible errors produced while building or persisting a rig
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Guide {0:?} does not exist in the scene")]
    MissingGuide(String),
    #[error("Folder {0:?} already exists in the scene")]
    FolderExists(String),
    #[error("Connection {connection:?} references missing component {component:?}")]
    MissingComponent {
        connection: String,
        component: String,
    },
    #[error("Component {component:?} has no {storage:?} entry at index {index}")]
    MissingStorageEntry {
        component: String,
        storage: StorageKind,
        index: usize,
    },
    #[error("{0} cannot be mirrored")]
    NotMirrorable(String),
    #[error("Limb {0:?} cannot be built: {1}")]
    InvalidLimb(String, String),
    #[error("Component {0:?} cannot be built: {1}")]
    InvalidComponent(String, String),
    #[error("Unsupported rig document version {0}")]
    UnsupportedVersion(u32),
    #[error("Failed to read rig document: {0}")]
    Document(#[from] ron::error::SpannedError),
    #[error("Failed to write rig document: {0}")]
    DocumentWrite(#[from] ron::Error),
}

pub type RigResult<T> = Result<T, RigError>;
