//! Student document service library.
//!
//! Per-student compliance documents: a catalog of document types, typed file
//! collections backed by a blob store, a verification ledger, and expiry tracking.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
