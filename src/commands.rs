//! Slash commands: declaration, registration and dispatch.

mod gpt;
mod registry;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::debug;
use strum::{AsRefStr, Display, EnumString};

use crate::error::Result;
use crate::interaction::CommandEvent;

pub use gpt::{GptSettings, GptState, gpt, respond};
pub use registry::{
    CommandDefinition, CommandParameter, CommandRegistrar, CommandRegistry, DiscordRegistrar,
    ParameterKind, RegisteredCommand, command_definitions,
};

/// Names of the slash commands this bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CommandName {
    Gpt,
}

pub type CommandFuture = BoxFuture<'static, Result<()>>;

/// Handler invoked with the interaction and the shared bot state.
pub type CommandHandler<E, S> = fn(E, Arc<S>) -> CommandFuture;

/// Routes interactions to the handler registered for their command name.
pub struct CommandDispatcher<E, S> {
    handlers: HashMap<CommandName, CommandHandler<E, S>>,
    state: Arc<S>,
}

impl<E: CommandEvent, S> CommandDispatcher<E, S> {
    pub fn new(state: Arc<S>) -> Self {
        Self {
            handlers: HashMap::new(),
            state,
        }
    }

    #[must_use]
    pub fn with_handler(mut self, name: CommandName, handler: CommandHandler<E, S>) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Returns the handler's future, or `None` when nothing handles this command.
    pub fn dispatch(&self, event: E) -> Option<CommandFuture> {
        let Some(handler) = CommandName::from_str(event.command_name())
            .ok()
            .and_then(|name| self.handlers.get(&name))
        else {
            debug!("Ignoring interaction for unknown command '{}'", event.command_name());
            return None;
        };

        Some(handler(event, Arc::clone(&self.state)))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::testing::{Call, FakeInteraction};
    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    fn count(_event: FakeInteraction, state: Arc<Counter>) -> CommandFuture {
        Box::pin(async move {
            state.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn command_names_round_trip_through_strings() {
        assert_eq!(CommandName::Gpt.as_ref(), "gpt");
        assert_eq!(CommandName::from_str("gpt").unwrap(), CommandName::Gpt);
        assert!(CommandName::from_str("chat").is_err());
    }

    #[tokio::test]
    async fn routes_known_command_to_its_handler() {
        let state = Arc::new(Counter::default());
        let dispatcher: CommandDispatcher<FakeInteraction, Counter> =
            CommandDispatcher::new(Arc::clone(&state)).with_handler(CommandName::Gpt, count);

        let future = dispatcher
            .dispatch(FakeInteraction::new("gpt", Some("hi")))
            .expect("gpt is registered");
        future.await.unwrap();

        assert_eq!(state.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_ignored_without_calls() {
        let state = Arc::new(Counter::default());
        let dispatcher: CommandDispatcher<FakeInteraction, Counter> =
            CommandDispatcher::new(Arc::clone(&state)).with_handler(CommandName::Gpt, count);
        let event = FakeInteraction::new("imagine", Some("a cat"));

        assert!(dispatcher.dispatch(event.clone()).is_none());
        assert_eq!(state.0.load(Ordering::SeqCst), 0);
        assert_eq!(event.calls(), Vec::<Call>::new());
    }

    #[test]
    fn known_name_without_handler_is_ignored() {
        let dispatcher: CommandDispatcher<FakeInteraction, Counter> =
            CommandDispatcher::new(Arc::new(Counter::default()));
        assert!(dispatcher.dispatch(FakeInteraction::new("gpt", None)).is_none());
    }
}
