//! Yarnscope Core
//!
//! Core types for the yarnscope job-performance monitor.
//!
//! This crate contains the domain entities shared between the ResourceManager
//! client and the dispatch daemon: analytic jobs, analysis results, and the
//! incremental poll window.

pub mod domain;
