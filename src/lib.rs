//! apktriage - static malware triage for Android packages
//!
//! This library derives a fixed-length indicator vector from a decompiled
//! application (manifest permissions plus `.smali` listings) and classifies
//! it with a two-stage cascade: a gradient-boosted primary classifier whose
//! Benign verdicts can be overridden by an isolation-forest anomaly model.

pub mod cascade;
pub mod cli;
pub mod config;
pub mod decompile;
pub mod extractor;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod schema;
pub mod vector;
