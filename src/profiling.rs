//! Profiling samples.
//!
//! A [`ProfilingSampler`] is a named sample allocated once at stage construction
//! and reused every frame. Entering it records `begin_sample`/`end_sample` into
//! the command sink so GPU captures show the effect name.
//!
//! # Enabling Tracy
//!
//! With the `profiling` feature every sample also opens a CPU span in Tracy:
//!
//! ```bash
//! cargo test --features profiling
//! ```

use crate::backend::CommandSink;

/// Named profiling sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingSampler {
    name: String,
}

impl ProfilingSampler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` inside this sample.
    pub fn scope<R>(
        &self,
        sink: &mut dyn CommandSink,
        f: impl FnOnce(&mut dyn CommandSink) -> R,
    ) -> R {
        let _span = cpu_span(&self.name);
        sink.begin_sample(&self.name);
        let result = f(&mut *sink);
        sink.end_sample(&self.name);
        result
    }
}

#[cfg(feature = "profiling")]
fn cpu_span(name: &str) -> Option<tracy_client::Span> {
    tracy_client::Client::running()
        .map(|client| client.span_alloc(Some(name), "", file!(), line!(), 0))
}

#[cfg(not(feature = "profiling"))]
fn cpu_span(_name: &str) {}
