//! Participant allow-list shared by the host session extensions.
//!
//! The list lives in a JSON document next to the host's data files. It is
//! loaded once at startup, hot-reloaded whenever the file is written, and
//! handed out as immutable [`AllowList`] snapshots so a reload can never be
//! observed half-applied.

mod error;
mod list;
mod store;
mod watch;

pub use error::AllowListError;
pub use list::{AllowList, AllowListEntries};
pub use store::AllowListStore;
pub use watch::AllowListWatcher;

/// File name used when the host does not configure one.
pub const DEFAULT_FILE_NAME: &str = "whitelist.json";
