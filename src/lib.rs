//! Document analysis backend.
//!
//! Accepts a document, asks a generative model for a summary, a document
//! type and pros/cons, and returns a fully-populated result.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod services;
