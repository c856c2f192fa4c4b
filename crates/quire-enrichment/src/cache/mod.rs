//! Classification result cache

mod key;
mod store;

pub use key::CacheKeyInput;
pub use store::{CacheEntry, CacheStore, LoadStats};
