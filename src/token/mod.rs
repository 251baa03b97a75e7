//! Token state: record types, the deterministic key scheme, the record
//! store accessor and the role lists.

pub mod roles;
pub mod storage;
pub mod types;

pub use roles::*;
pub use storage::*;
pub use types::*;
