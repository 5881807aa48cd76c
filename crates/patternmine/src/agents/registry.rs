//! Name-based routing of messages to agents.

use indexmap::IndexMap;
use tracing::debug;

use super::message::{Message, Reply};
use super::PatternAgent;
use crate::error::{PatternError, Result};

/// Maps agent names to agents.
#[derive(Default)]
pub struct Registry {
    agents: IndexMap<String, Box<dyn PatternAgent>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own name, replacing any previous one.
    pub fn register(&mut self, agent: impl PatternAgent + 'static) {
        self.register_as(agent.name().to_string(), Box::new(agent));
    }

    /// Register an agent under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, agent: Box<dyn PatternAgent>) {
        self.agents.insert(name.into(), agent);
    }

    pub fn get(&self, name: &str) -> Option<&dyn PatternAgent> {
        self.agents.get(name).map(|a| a.as_ref())
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Deliver a message to its receiver.
    pub fn send(&self, message: &Message) -> Result<Reply> {
        let agent = self
            .get(&message.receiver)
            .ok_or_else(|| PatternError::RouteNotFound {
                receiver: message.receiver.clone(),
            })?;

        debug!(
            sender = %message.sender,
            receiver = %message.receiver,
            kind = %message.kind,
            "dispatching message"
        );
        agent.handle(message)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}
