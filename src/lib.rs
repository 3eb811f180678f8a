//! Offline-first data layer for the family dashboard.
//!
//! A local [`store`] holds collections of records, a [`queue`] of pending
//! changes is replayed against the server by [`sync`], and [`cache`] serves
//! assets when the network is gone. The [`worker`] ties them together behind
//! the [`bus`].

pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod notify;
pub mod queue;
pub mod store;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
