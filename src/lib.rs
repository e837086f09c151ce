//! `TireDesk` - persistence and business rules for a tire-logistics desk
//!
//! This crate backs an internal tool where fleet clients file complaints with
//! photo evidence, chat with staff about them, and place orders, while staff
//! track dispatch performance and forecast demand. Everything here is the
//! layer under the screens: repositories over SQLite, a content store for
//! images, and pure KPI/forecast math.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::todo,
    clippy::unimplemented,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy here
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss, // KPI and forecast math casts counts to f64
)]

/// Configuration: env-var paths/salt plus `config.toml` seed accounts
pub mod config;
/// Pure business math - KPI aggregation and demand forecasting
pub mod core;
/// SQLite repositories - credentials, complaints, orders, chat threads
pub mod db;
/// Unified error types and result handling
pub mod errors;
/// Plain data records and the `Principal` identity value
pub mod models;
/// Filesystem content store for complaint images
pub mod uploads;
