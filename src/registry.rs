//! Load-time registry of agent implementations.
//!
//! Implementations are Rust types registered under a key. Code units then refer to these
//! keys (see [`crate::agent_collector`]), so the capability contract is checked by the
//! compiler instead of being discovered by inspecting types at runtime.

use std::{collections::BTreeMap, fmt};

use crate::{
    agent::{Agent, AgentContext},
    agents::{LlmHinter, TemplateAgent},
};

type Constructor = dyn Fn(AgentContext) -> anyhow::Result<Box<dyn Agent>> + Send + Sync;

/// Maps implementation keys to agent constructors.
#[derive(Default)]
pub struct AgentRegistry {
    entries: BTreeMap<String, Box<Constructor>>,
}

impl AgentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the reference agents shipped with the crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TemplateAgent::KEY, |_| Ok(TemplateAgent));
        registry.register(LlmHinter::KEY, |ctx| Ok(LlmHinter::new(ctx)));
        registry
    }

    /// Registers `constructor` under `key`, replacing any previous entry.
    pub fn register<A, F>(&mut self, key: impl Into<String>, constructor: F) -> &mut Self
    where
        A: Agent + 'static,
        F: Fn(AgentContext) -> anyhow::Result<A> + Send + Sync + 'static,
    {
        self.entries.insert(
            key.into(),
            Box::new(move |ctx| Ok(Box::new(constructor(ctx)?) as Box<dyn Agent>)),
        );
        self
    }

    /// True if `key` names a registered implementation.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Builds the implementation registered under `key`, `None` if the key is unknown.
    pub fn construct(
        &self,
        key: &str,
        ctx: AgentContext,
    ) -> Option<anyhow::Result<Box<dyn Agent>>> {
        self.entries.get(key).map(|constructor| constructor(ctx))
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}
