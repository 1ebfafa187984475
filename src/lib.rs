//! Library crate for matchbook-back, exposing modules for binaries and integration tests.

pub mod config;
/// Workbook access: sheet gateways, sheet layouts and repositories.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes grouped by screen.
pub mod routes;
/// Use cases called by the routes.
pub mod services;
/// Shared application state and per-session engines.
pub mod state;
