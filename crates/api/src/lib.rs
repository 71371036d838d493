//! HTTP API: the tenant-scoped permission catalog / role registry service.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
