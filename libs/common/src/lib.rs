//! Common library for the Shutterbook services
//!
//! This crate provides shared functionality used by the auth service and the
//! marketplace API: database connectivity and migrations, the Redis cache,
//! token issuance and verification, the authentication middleware, the JSON
//! response envelope and request validation.

pub mod auth;
pub mod cache;
pub mod database;
pub mod error;
pub mod jwt;
pub mod response;
pub mod server;
pub mod telemetry;
pub mod validation;
