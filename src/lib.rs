//! Built-in token function engine of a sharded ledger's virtual machine.
//!
//! A fixed catalogue of protocol-level DCT operations (local mint and
//! burn, freeze/unfreeze and wipe, NFT create, NFT attribute update, the
//! NFT create-role hand-off and the multi-asset cross-shard transfer)
//! that mutate account-held token state outside of user bytecode. The
//! crate also owns the `@`-hex call-frame codec those operations speak and
//! the deterministic key scheme their records live under.
//!
//! The hosting VM dispatches calls through [`builtins::BuiltinRegistry`];
//! everything the engine needs from its environment (account storage,
//! shard layout, pause flags, payability, epochs, the record codec) comes
//! in through traits.

pub mod account;
pub mod builtins;
pub mod codec;
pub mod config;
pub mod error;
pub mod gas;
pub mod guard;
pub mod token;
pub mod vm;

pub use account::{Account, AccountDataHandler, AccountsAdapter, MemAccountsStore, StorageError};
pub use builtins::{ActivationEpochs, BuiltinFunction, BuiltinRegistry, RegistryArgs};
pub use codec::{CallArgsParser, CodecError, JsonMarshalizer, Marshalizer, StorageUpdate};
pub use error::{DctError, DctResult};
pub use gas::{BaseOperationCost, BuiltInCost, GasCost};
pub use guard::{PauseHandler, PayableHandler, RolesHandler};
pub use token::{NftMetadata, RoleSet, TokenKind, TokenProperties, TokenRecord};
pub use vm::{Address, CallInput, CallOutput, EpochProvider, ShardCoordinator, ShardId};
