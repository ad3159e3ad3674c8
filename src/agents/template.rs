use crate::agent::{Agent, HintRequest};

/// Starting point for new submissions: a constant hint and no similarity search.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateAgent;

impl TemplateAgent {
    /// Registry key.
    pub const KEY: &'static str = "template";
}

impl Agent for TemplateAgent {
    fn name(&self) -> String {
        Self::KEY.to_owned()
    }

    fn hint(&mut self, _request: &HintRequest<'_>) -> anyhow::Result<String> {
        Ok("42".to_owned())
    }

    fn similarity_search(&mut self, _query: &str, _k: usize) -> anyhow::Result<Vec<String>> {
        Ok(vec![])
    }
}
