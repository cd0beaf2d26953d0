//! The pipeline driver: wires
//! lex → parse → interpolate → scope resolution → type unification →
//! graph lowering into one call, threading a shared [`NodeIdGen`] and
//! [`StringInterner`] the whole way so ids and names stay consistent
//! across stages.
//!
//! Import downloading and `Output()` materialization are deliberately
//! separate entry points ([`resolve_imports`], [`output`]) rather than
//! folded into [`compile`]: both need embedder-supplied collaborators
//! ([`Downloader`], [`ResourceRegistry`]/[`FieldNameMap`]) that a caller
//! may not always have on hand (e.g. a formatter-only tool never needs
//! either).

use std::path::PathBuf;
use std::time::Duration;

use mcl_diagnostic::Result;
use mcl_graph::{FieldNameMap, Graph, Lowerer, ProgOutput, ResourceRegistry};
use mcl_ir::ast::Prog;
use mcl_ir::{NodeIdGen, StringInterner};
use mcl_scope::import::{fetch_with_retry, Downloader, ImportData};
use mcl_scope::{set_scope, CopyLineage, Scope};
use mcl_typeck::{collect_invariants, Polymorphisms, Solver};
use mcl_types::Type;

/// Parameters that thread through a compile that reach past the type
/// checker: where a remote import's clone lands, how many times and how
/// far apart `Downloader` retries a failed fetch, and how deep recursive
/// local `import`s may nest before giving up.
/// Negative `depth` means unlimited.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub modules_path: PathBuf,
    pub retry: u32,
    pub backoff: Duration,
    pub depth: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            modules_path: PathBuf::from("mcl_modules"),
            retry: 2,
            backoff: Duration::from_millis(200),
            depth: -1,
        }
    }
}

/// Everything `compile` produces: the resolved, rewritten program; the
/// import directives scope resolution collected along the way; and the
/// per-node types the unifier settled on.
pub struct CompileResult {
    pub prog: Prog,
    pub imports: Vec<ImportData>,
    pub types: Vec<(mcl_ir::NodeId, Type)>,
}

/// Runs lex/parse/interpolate/scope/typecheck over `source`.
/// `interner` and `id_gen` are shared with the caller so a
/// later [`output`] call (or a second `compile` over an `include`d file)
/// sees the same names and ids.
#[tracing::instrument(level = "info", skip_all)]
pub fn compile(
    source: &str,
    interner: &mut StringInterner,
    id_gen: &NodeIdGen,
    builtins: &dyn Polymorphisms,
) -> Result<CompileResult> {
    let prog = mcl_parse::parse_with_id_gen(source, None, interner, id_gen)?;
    let prog = mcl_interp::interpolate_prog(prog, interner, id_gen)?;

    let mut lineage = CopyLineage::new();
    let scope_result = set_scope(&prog.body, &Scope::new(), id_gen, &mut lineage)?;
    let prog = Prog { body: scope_result.body, ..prog };

    let (invariants, spans) = collect_invariants(&prog, id_gen, builtins);
    let mut solver = Solver::new();
    solver.solve(invariants, &spans)?;
    let types = solver.resolved_types();

    Ok(CompileResult { prog, imports: scope_result.imports, types })
}

/// Fetches every remote import a prior [`compile`] collected, via
/// `downloader`, honoring `config`'s retry/backoff.
/// Stops at the first import whose fetch exhausts its retries.
#[tracing::instrument(level = "info", skip_all)]
pub fn resolve_imports(imports: &[ImportData], downloader: &dyn Downloader, config: &PipelineConfig) -> Result<()> {
    for import in imports {
        if import.url.is_some() {
            fetch_with_retry(downloader, import, &config.modules_path, config.retry, config.backoff)?;
        }
    }
    Ok(())
}

/// Lowers `prog` into a fresh reactive graph and materializes its
/// resources/edges through `registry`/`fields`.
#[tracing::instrument(level = "info", skip_all)]
pub fn output<R: ResourceRegistry>(
    prog: &Prog,
    registry: &R,
    fields: &dyn FieldNameMap,
    interner: &StringInterner,
) -> Result<(Graph, ProgOutput<R::Resource>)> {
    let mut graph = Graph::new();
    Lowerer::new(&mut graph).lower_block(&prog.body, &Scope::new());
    let prog_output = mcl_graph::output_prog(prog, registry, fields, interner)?;
    Ok((graph, prog_output))
}
