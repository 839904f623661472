//! Backend registry
//!
//! Maps model names to shared backend instances so sessions can select
//! a model by the name their client sent.

use std::collections::HashMap;
use std::sync::Arc;

use super::backend::InferenceBackend;

/// Registry of inference backends keyed by name
///
/// Built once at startup and shared read-only by every session. The
/// first registered backend becomes the default.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn InferenceBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own name
    pub fn register(&mut self, backend: Arc<dyn InferenceBackend>) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, backend);
    }

    /// Look up a backend by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn InferenceBackend>> {
        self.backends.get(name).cloned()
    }

    /// The default backend, if any were registered
    pub fn default_backend(&self) -> Option<Arc<dyn InferenceBackend>> {
        self.default_name.as_deref().and_then(|n| self.get(n))
    }

    /// Names of all registered backends
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}
