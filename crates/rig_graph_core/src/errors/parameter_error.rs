use thiserror::Error;

/// Rejection of a parameter value at construction time.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{0:?} is not a valid name, expected an identifier matching ^[a-zA-Z_]\\w*$")]
    InvalidName(String),
    #[error("{0:?} is not a valid side, expected one of L, R, C")]
    InvalidSide(String),
    #[error("Index must be a non-negative integer, got {0}")]
    NegativeIndex(i64),
    #[error("Expected a non-negative finite number, got {0}")]
    InvalidUnsignedFloat(f64),
    #[error("Color channel {channel} is out of range: {value}")]
    ColorOutOfRange { channel: usize, value: i64 },
    #[error("Expected {expected} values, got {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("Matrix contains non-finite values")]
    NonFiniteMatrix,
    #[error("{0} has no mirrored counterpart")]
    NotMirrorable(String),
}
