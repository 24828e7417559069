//! The diagram generator seam.

use async_trait::async_trait;
use ohm_core::circuit::CircuitJson;
use ohm_core::prompt::{build_diagram_prompt, NEGATIVE_PROMPT};

use crate::api::{DiagramApi, GenerateRequest, RenderError};
use crate::config::RenderConfig;

/// Produces a rendered diagram for a circuit and returns its URL.
///
/// Errors propagate to the caller unchanged; there is no retry at this
/// layer.
#[async_trait]
pub trait DiagramGenerator: Send + Sync {
    async fn generate(&self, circuit: &CircuitJson) -> Result<String, RenderError>;
}

/// Production generator: builds a prompt and calls the image endpoint.
pub struct HttpDiagramGenerator {
    api: DiagramApi,
    model: String,
    width: u32,
    height: u32,
}

impl HttpDiagramGenerator {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        Ok(Self::with_api(DiagramApi::from_config(config)?, config))
    }

    /// Use an already-built API client (shared connection pool, tests).
    pub fn with_api(api: DiagramApi, config: &RenderConfig) -> Self {
        Self {
            api,
            model: config.model.clone(),
            width: config.width,
            height: config.height,
        }
    }
}

#[async_trait]
impl DiagramGenerator for HttpDiagramGenerator {
    async fn generate(&self, circuit: &CircuitJson) -> Result<String, RenderError> {
        let prompt = build_diagram_prompt(circuit);
        tracing::debug!(
            components = circuit.components.len(),
            connections = circuit.connections.len(),
            prompt_chars = prompt.len(),
            "Requesting diagram render",
        );

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            negative_prompt: NEGATIVE_PROMPT,
            width: self.width,
            height: self.height,
        };
        self.api.generate(&request).await
    }
}

/// Stand-in used when no image endpoint is configured: every call fails
/// with [`RenderError::NotConfigured`], so jobs are marked failed instead of
/// silently staying queued.
pub struct UnconfiguredGenerator;

#[async_trait]
impl DiagramGenerator for UnconfiguredGenerator {
    async fn generate(&self, _circuit: &CircuitJson) -> Result<String, RenderError> {
        Err(RenderError::NotConfigured)
    }
}
