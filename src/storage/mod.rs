//! Collaborators the ledger persists to and is fed from.
//!  - [settings::SettingsStore] holds the block list, the tracking flag and the login.
//!  - [time_source::TimeSource] is the tracker owning today's usage map.
//!
//! Both come with a file backed implementation that keeps json documents in the application
//! directory.

pub mod settings;
pub mod time_source;
