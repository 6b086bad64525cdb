//! Foglio: a small social publishing service.
//!
//! Feed composition, access control, write coordination, and a TTL-bounded
//! response cache for the global feed, exposed over HTTP.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
