use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::InputRenderer;

/// Maps input type tags to renderers. New input types register here without
/// touching the dispatcher.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn InputRenderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registers a renderer under every input type it claims.
    pub fn register(&mut self, renderer: Arc<dyn InputRenderer>) {
        for inputtype in renderer.handled_input_types() {
            self.renderers.insert(inputtype, renderer.clone());
        }
    }

    /// Registers a renderer under an explicit type tag, overriding any
    /// previous claim.
    pub fn register_as(&mut self, inputtype: &str, renderer: Arc<dyn InputRenderer>) {
        self.renderers.insert(inputtype.to_string(), renderer);
    }

    pub fn get(&self, inputtype: &str) -> Option<Arc<dyn InputRenderer>> {
        self.renderers.get(inputtype).cloned()
    }
}
