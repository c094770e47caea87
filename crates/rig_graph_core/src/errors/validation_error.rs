use thiserror::Error;

use crate::{edge_data::DataSpec, scene::Plug};

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphValidationError {
    #[error("{0:?} ({2:?}) and {1:?} ({3:?}) have different types but are connected.")]
    InconsistentPinTypes(Plug, Plug, DataSpec, DataSpec),
    #[error("{0:?} is an output and cannot be the target of a connection")]
    TargetIsOutput(Plug),
    #[error("{0:?} is indexed but the attribute is not a multi attribute")]
    IndexOnSinglePlug(Plug),
    #[error("{0:?} addresses a multi attribute without an index")]
    MissingIndex(Plug),
    #[error("{0:?} selects an axis but the attribute is not a vector")]
    AxisOnNonVector(Plug),
}
