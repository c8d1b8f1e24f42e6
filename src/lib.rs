//! Core library for the jira2sheets command line application.
//!
//! The library pulls the CSV export of saved JIRA filters page by page, aligns
//! the pages' columns and mirrors the result into Google Sheets tabs. Transport
//! adapters live under [`io`], the cell and table types in [`model`], the column
//! alignment in [`reconcile`] and the run loop in [`import`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod import;
pub mod io;
pub mod model;
pub mod reconcile;

pub use error::{Result, ToolError};
