//! Domain model for the crawl
//!
//! # Components
//!
//! - `AccountRef` / `DiscoveredAccount`: account identities and result records
//! - `CollectibleState`: decoded collectible bitmask
//! - `payload`: typed provider responses (account snapshot, match history, match report)

mod account;
mod collectible;
pub mod payload;

// Re-export main types
pub use account::{AccountRef, DiscoveredAccount};
pub use collectible::{CollectibleState, COLLECTIBLE_FLAGS};
pub use payload::{ActivityHistory, MatchReport, ProfileSnapshot};
