//! Common test utilities for integration tests.
//!
//! Helpers for building chains and environments without touching the
//! process environment.

use std::sync::Arc;

use propchain::source::MapSource;
use propchain::{Environment, SharedSource};

/// Wraps a map source for insertion into a chain.
pub fn shared(source: MapSource) -> SharedSource {
    Arc::new(source)
}

/// Builds a map source from key/value pairs.
pub fn map_source(name: &str, pairs: &[(&str, &str)]) -> MapSource {
    pairs
        .iter()
        .fold(MapSource::new(name), |source, (k, v)| source.with(*k, *v))
}

/// Builds an environment whose chain holds `sources`, first = highest
/// precedence.
pub fn environment(sources: Vec<MapSource>) -> Environment {
    let env = Environment::new();
    for source in sources {
        env.sources().add_last(shared(source));
    }
    env
}

/// Creates a temporary directory for file-loading tests.
#[allow(dead_code)]
pub fn create_temp_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::tempdir()
}
