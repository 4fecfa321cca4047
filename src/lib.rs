//! Cluster health badges for shields.io
//!
//! Lists pods and nodes from the Kubernetes API on every request and renders
//! the healthy/total ratio as an endpoint badge document.

pub mod aggregate;
pub mod badge;
pub mod cluster;
pub mod config;
pub mod server;
