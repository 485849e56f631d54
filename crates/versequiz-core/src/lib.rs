//! versequiz-core: adaptive verse selection, question construction, and grading.
//!
//! This crate holds the data model, the exam and practice samplers, the
//! answer grader, the verse score ledger, and the JSON store that the
//! `versequiz` binary drives.

pub mod config;
pub mod error;
pub mod grader;
pub mod history;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod question;
pub mod retry;
pub mod sampler;
pub mod session;
pub mod statistics;
pub mod store;
pub mod weights;
