//! Content-addressed result cache.
//!
//! Transform results are stored best-effort under a key derived from the
//! job payload and its normalized parameters. The cache is never
//! authoritative: absence is a miss, store failures are swallowed, and
//! entries are write-once.

pub mod key;
pub mod store;

pub use key::JobKey;
pub use store::{ContentCache, FsCache, MemoryCache};
