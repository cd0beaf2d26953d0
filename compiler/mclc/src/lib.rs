//! Pipeline driver: wires the lexer, parser, interpolator, scope
//! resolver, type unifier, and graph lowerer into one front end, and
//! defines the external collaborator traits the core crates leave as
//! narrow interfaces — `ResourceRegistry`/`FieldNameMap`
//! (`mcl_graph`), `Downloader` (`mcl_scope`), plus the two this crate
//! owns outright: `FunctionLookup` and `Fs`.

pub mod builtins;
pub mod downloader;
pub mod fs;
pub mod pipeline;
pub mod registry;
pub mod tracing_setup;

pub use builtins::{FuncDescriptor, FunctionLookup, Registry};
pub use downloader::GitDownloader;
pub use fs::{FileKind, Fs, OsFs};
pub use pipeline::{compile, output, resolve_imports, CompileResult, PipelineConfig};
pub use registry::{DemoRegistry, DemoResource, FieldSpec, FieldValue};
pub use tracing_setup::init_tracing;
