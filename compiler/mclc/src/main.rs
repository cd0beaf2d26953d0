//! A minimal CLI stub: parses a path argument, compiles it, and prints
//! the resulting resource/edge counts. Not a designed CLI — an embedder
//! building a real command surface owns that.

use mclc::{compile, output, DemoRegistry, Registry};
use mcl_ir::{NodeIdGen, StringInterner};
use rustc_hash::FxHashMap;

fn main() {
    mclc::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: mclc <file.mcl>");
        std::process::exit(1);
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {path}: {e}");
            std::process::exit(1);
        }
    };

    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let compiled = match compile(&source, &mut interner, &id_gen, &builtins) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let registry = DemoRegistry::new(FxHashMap::default());
    let fields = DemoRegistry::new(FxHashMap::default());
    match output(&compiled.prog, &registry, &fields, &interner) {
        Ok((graph, prog_output)) => {
            println!(
                "{path}: {} resources, {} edges, {} graph nodes",
                prog_output.resources.len(),
                prog_output.edges.len(),
                graph.nodes().len()
            );
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
