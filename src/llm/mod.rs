use crate::sys::llm::Turn;

pub mod chronicler;
pub mod gemini;

/// A single outbound generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: String,
    pub contents: Vec<Turn>,
}

pub trait GenerativeService: Send {
    /// `Ok(None)` when the service answered without any text.
    fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Option<String>>;
}

impl<S: GenerativeService + Sync + ?Sized> GenerativeService for std::sync::Arc<S> {
    fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Option<String>> {
        (**self).generate(request)
    }
}
