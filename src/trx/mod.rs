//! Transactions: change logging and rollback

pub mod change_log;
pub mod entry;

pub use change_log::ChangeLog;
pub use entry::{ChangeEntry, LogKey};
