//! Cross-entity reporting and identity aggregation over FIR, accused and
//! bail records.
//!
//! Pipeline: record store → join resolver → grouping engine / identity
//! resolver → report assembler → presentation and export layers.

pub mod config;
pub mod error;
pub mod export;
pub mod grouping_engine;
pub mod identity_resolver;
pub mod join_resolver;
pub mod model;
pub mod name_generator;
pub mod query;
pub mod report;
pub mod report_assembler;
pub mod rng;
pub mod seed;
pub mod store;
pub mod types;
