//! Reference agents shipped with the harness.

mod llm_hinter;
mod template;

pub use llm_hinter::LlmHinter;
pub use template::TemplateAgent;
