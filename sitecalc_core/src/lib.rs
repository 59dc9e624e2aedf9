//! # sitecalc_core - Construction-Site Calculation Engine
//!
//! `sitecalc_core` is the computational core of SiteCalc: code-book checks
//! for construction-site work, currently excavation slope stability and
//! hydraulic truck-crane sizing. All inputs and outputs are
//! JSON-serializable, so the crate drops into any shell that can speak
//! JSON, from a desktop UI to a service endpoint.
//!
//! ## Design Philosophy
//!
//! - **Pure evaluators**: calculations are functions of their parameter
//!   model (plus the read-only crane-spec store), with no hidden state
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//! - **Stable codes**: calculation kinds persist as fixed integer codes
//!
//! ## Quick Start
//!
//! ```rust
//! use sitecalc_core::crane_db::MemoryCraneStore;
//! use sitecalc_core::dispatch::calculate;
//! use sitecalc_core::params::ParameterModel;
//!
//! let model = ParameterModel::new_slope("Pit A");
//! let store = MemoryCraneStore::new();
//! let result = calculate(&model, &store).unwrap();
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - Calculation kinds and their stable codes
//! - [`params`] - Typed parameter models with validation
//! - [`dispatch`] - Formula evaluators and the kind dispatcher
//! - [`crane_db`] - Crane specifications and capacity-chart lookup
//! - [`report`] - Report composition and PDF rendering
//! - [`store`] - Open-project registry with lifecycle and observers
//! - [`file_io`] - Project files with atomic saves and versioning
//! - [`errors`] - Structured error types

pub mod crane_db;
pub mod dispatch;
pub mod errors;
pub mod file_io;
pub mod params;
pub mod registry;
pub mod report;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use dispatch::{calculate, CalculationResult};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_model, save_model, SCHEMA_VERSION};
pub use params::{CalculationParams, ParameterModel, ProjectId};
pub use registry::CalculationKind;
pub use store::{ProjectState, ProjectStore, StoreEvent};
