//! Tracing initialization for the pipeline driver.
//!
//! Controlled by the `MCLC_LOG` environment variable (`RUST_LOG` syntax),
//! falling back to `RUST_LOG`. Defaults to `warn` when neither is set.
//! Library crates (`mcl_lexer`, `mcl_parse`, ...) only ever emit through
//! `tracing`'s macros; nothing downstream of here installs a subscriber of
//! its own, so callers that embed `mclc` as a library may skip this and
//! install their own instead.

use std::sync::OnceLock;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs a global `tracing` subscriber. Safe to call multiple times —
/// only the first call takes effect.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env("MCLC_LOG")
            .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        Registry::default()
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr).compact())
            .with(filter)
            .init();
    });
}
