//! Core value types shared by the `bank-permit` crates.
//!
//! These types carry no chain access of their own. They exist so the configuration layer can
//! validate user input before any network activity, and so the deposit pipeline can pass typed
//! values between its stages.
//!
//! # Modules
//!
//! - [`timestamp`] - Unix timestamps used as permit deadlines
//! - [`util`] - Helper types (human-readable money amounts)

pub mod timestamp;
pub mod util;
