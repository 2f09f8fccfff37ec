//! Change notifications for work orders.
//!
//! Writers publish a `ChangeEvent` after every committed change; views such
//! as the `BoardCache` subscribe and refetch the full board.

pub mod board_cache;
pub mod change_feed;

pub use board_cache::BoardCache;
pub use change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
