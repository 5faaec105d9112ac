//! Keeps track of the time spent on sites during the day, a list of sites to block and whether
//! tracking is on, and shows weekly reports fetched from a backend.
//!
//! [session::PopupSession] is the entry point. It owns a [ledger::UsageLedger] and the
//! collaborators feeding it.

pub mod backend;
pub mod cli;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod utils;
