//! Aggregates raw cucumber run histories pushed by a CI collector into an
//! ordered, windowed dashboard view model.

pub mod auth;
pub mod error;
pub mod events;
pub mod humanize;
pub mod ordering;
pub mod raw;
pub mod report;
pub mod stability;
pub mod store;
pub mod summary;
pub mod transport;
pub mod window;
