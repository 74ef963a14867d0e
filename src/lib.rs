//! # expense-tracker
//!
//! Client for a REST expense API with a monthly budget dashboard.
//!
//! ## Key Concepts
//!
//! - **Backoff fetch**: listing expenses retries 429 responses with
//!   exponential delay (see [`fetch`])
//! - **Session**: logged-in user and monthly budget, persisted in a
//!   key-value store (see [`session`], [`store`])
//! - **Budget pipeline**: per-user totals, category buckets, pagination and
//!   the low-budget alert (see [`budget`])
//! - **Mock server**: an in-memory copy of the API for offline use (see
//!   [`server`])

pub mod api;
pub mod budget;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod expenses;
pub mod fetch;
pub mod format;
pub mod server;
pub mod session;
pub mod store;
pub mod validation;

pub use config::Config;
