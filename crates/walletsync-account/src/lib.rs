//! walletsync account service core
//!
//! - [`AccountLedger`]: lazily created account records, atomic deposits
//! - [`IdentityResolver`]: pull-on-read from the identity service
//! - [`ProfileSyncPropagator`]: push-on-write of display names, best effort
//! - [`IdentityDirectory`]: how the above reach the identity service
//!   ([`LocalDirectory`] in-process, [`HttpDirectory`] over the network)

pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod resolver;
pub mod sync;

pub use config::{DirectoryConfig, DirectoryMode, SyncConfig};
pub use directory::{
    DirectoryError, DirectoryResult, HttpDirectory, IdentityDirectory, LocalDirectory,
};
pub use error::{LedgerError, LedgerResult};
pub use ledger::AccountLedger;
pub use resolver::IdentityResolver;
pub use sync::{ProfileSyncPropagator, SyncStats};
