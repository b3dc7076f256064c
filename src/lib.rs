//! Familiar Loader Codegen
//!
//! Compiles linked-data schema graphs (records, enums, unions, arrays with
//! JSON-LD predicates) into Rust loader modules that validate documents,
//! expand identifiers, and serialize them back.
//!
//! ## Pipeline
//!
//! ```text
//! schema.yml ──► SchemaDocument ──► compile ──► ModulePlan ──► rust::render_module
//!                                     │              │
//!                     TypeResolver ───┤              └──► eval::Evaluator
//!               FieldLoaderBuilder ───┤                   (runs the plan
//!                    RecordEmitter ───┤                    against documents)
//!                    ModuleEmitter ───┘
//! ```
//!
//! Loaders are interned by name in a `TypeCatalog`, so structurally equal
//! types share one module-level binding in the generated code.

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod graph;
pub mod schema;

pub use checksum::Checksum;
pub use codegen::{
    compile, generate, generate_rust, CompileOptions, CompiledModule, GeneratedOutput, ModulePlan,
    RenderProfile, ResolutionStrategy,
};
pub use config::CodegenConfig;
pub use diagnostics::{DiagnosticCode, Diagnostics};
pub use error::{CodegenError, Result};
pub use eval::{Evaluator, LoadingOptions, Node, ValidationError};
pub use schema::SchemaDocument;
