//! Error taxonomy of the built-in function engine.
//!
//! Every error is terminal for the call that produced it: the function
//! returns the error and commits nothing. Frozen/pause state errors are the
//! one family with an escape hatch, see
//! [`guard::check_frozen_and_paused`](crate::guard::check_frozen_and_paused).

use thiserror::Error;

use crate::account::StorageError;
use crate::codec::CodecError;

/// Result type used across the engine.
pub type DctResult<T> = Result<T, DctError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DctError {
    // ===== Argument errors =====
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid receiver address")]
    InvalidRcvAddr,

    #[error("invalid quantity to transfer")]
    InvalidNftQuantity,

    #[error("value must be a positive integer")]
    NegativeValue,

    #[error("built-in function called with value")]
    CalledWithValue,

    // ===== Permission errors =====
    #[error("action is not allowed: missing role {0}")]
    ActionNotAllowed(String),

    #[error("caller is not the token system smart contract")]
    AddressIsNotSystemSC,

    #[error("required account was not provided")]
    MissingAccount,

    // ===== Resource errors =====
    #[error("not enough gas")]
    NotEnoughGas,

    // ===== State errors =====
    #[error("token is frozen for account")]
    FrozenForAccount,

    #[error("token is paused")]
    TokenIsPaused,

    #[error("destination account is not payable")]
    AccountNotPayable,

    #[error("NFT does not have metadata")]
    NftDoesNotHaveMetadata,

    #[error("NFT token does not exist")]
    NftTokenDoesNotExist,

    #[error("a different NFT is already stored on the destination at this nonce")]
    WrongNftOnDestination,

    #[error("cannot wipe an account that is not frozen")]
    CannotWipeAccountNotFrozen,

    // ===== Catalogue errors =====
    #[error("built-in function not found: {0}")]
    FunctionNotFound(String),

    #[error("built-in function not active: {0}")]
    FunctionNotActive(String),

    // ===== Infrastructure =====
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl DctError {
    /// Shorthand for argument errors with a static reason.
    pub fn invalid_arguments(reason: &str) -> Self {
        DctError::InvalidArguments(reason.to_string())
    }
}
