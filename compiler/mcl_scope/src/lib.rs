//! Scope resolution, class/`include` expansion, and the import/module
//! loader.
//!
//! `set_scope` (see `resolve` module) threads an immutable scope downward
//! through a program, expanding every `Include` into a fresh copy of its
//! class body and detecting duplicate bindings and recursive classes along
//! the way. `import` classifies raw import text and drives the external
//! [`Downloader`](import::Downloader) collaborator with retry/backoff.

mod lineage;
mod resolve;
mod scope;

pub mod import;

pub use lineage::CopyLineage;
pub use resolve::{set_scope, ScopeResult};
pub use scope::{ClassDef, Scope};
