//! Shared data structures for the webhook receiver
//!
//! - `Message`: the Alertmanager notification payload
//! - `Alert`: a single alert, the unit of stored history
//! - `MessageEntry`: an identifier and its alerts, as returned by listing

mod alert;

pub use alert::*;
