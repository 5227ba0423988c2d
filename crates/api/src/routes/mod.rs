//! HTTP route handlers

pub mod analyses;
pub mod metrics;
