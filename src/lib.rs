//! Coach Orchestrator - AI request orchestration for relationship coaching
//!
//! This crate routes requests for five coaching agents through a semantic
//! cache, a provider router and an error classifier so that every request
//! ends with schema-valid output. Batches, scheduling and signed provider
//! webhooks are exposed over HTTP.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
