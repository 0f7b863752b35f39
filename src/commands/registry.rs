//! Command declarations and their synchronisation with Discord.

use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use poise::serenity_prelude::{
    Command, CommandId, CommandOptionType, CreateCommand, CreateCommandOption, GuildId, Http,
};

use crate::error::{BotError, Result};

use super::CommandName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParameter {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParameterKind,
    pub required: bool,
}

/// A slash command as declared to Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: CommandName,
    pub description: &'static str,
    pub parameters: Vec<CommandParameter>,
}

impl CommandDefinition {
    fn to_builder(&self) -> CreateCommand {
        self.parameters.iter().fold(
            CreateCommand::new(self.name.as_ref()).description(self.description),
            |command, parameter| {
                let kind = match parameter.kind {
                    ParameterKind::String => CommandOptionType::String,
                };
                command.add_option(
                    CreateCommandOption::new(kind, parameter.name, parameter.description)
                        .required(parameter.required),
                )
            },
        )
    }
}

/// Every command the bot declares at startup.
pub fn command_definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition {
        name: CommandName::Gpt,
        description: "Ask the language model a question",
        parameters: vec![CommandParameter {
            name: "prompt",
            description: "Prompt to send to the model",
            kind: ParameterKind::String,
            required: true,
        }],
    }]
}

/// Handle returned by Discord for a created command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: CommandId,
    pub name: String,
}

/// Creates and deletes application commands on the platform.
pub trait CommandRegistrar: Send + Sync {
    fn create(
        &self,
        definition: &CommandDefinition,
    ) -> impl Future<Output = Result<RegisteredCommand>> + Send;

    fn delete(&self, command: &RegisteredCommand) -> impl Future<Output = Result<()>> + Send;
}

/// Registers commands in one guild, or globally when no guild is set.
pub struct DiscordRegistrar {
    http: Arc<Http>,
    guild_id: Option<GuildId>,
}

impl DiscordRegistrar {
    pub fn new(http: Arc<Http>, guild_id: Option<GuildId>) -> Self {
        Self { http, guild_id }
    }
}

impl CommandRegistrar for DiscordRegistrar {
    async fn create(&self, definition: &CommandDefinition) -> Result<RegisteredCommand> {
        let builder = definition.to_builder();
        let command = match self.guild_id {
            Some(guild_id) => guild_id.create_command(&self.http, builder).await?,
            None => Command::create_global_command(&self.http, builder).await?,
        };
        Ok(RegisteredCommand {
            id: command.id,
            name: command.name,
        })
    }

    async fn delete(&self, command: &RegisteredCommand) -> Result<()> {
        match self.guild_id {
            Some(guild_id) => guild_id.delete_command(&self.http, command.id).await?,
            None => Command::delete_global_command(&self.http, command.id).await?,
        }
        Ok(())
    }
}

/// Declared commands plus the handles Discord returned for them.
pub struct CommandRegistry {
    definitions: Vec<CommandDefinition>,
    registered: Vec<RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        Self {
            definitions,
            registered: Vec::new(),
        }
    }

    pub fn registered(&self) -> &[RegisteredCommand] {
        &self.registered
    }

    /// Creates every declared command, stopping at the first failure.
    pub async fn register_all(&mut self, registrar: &impl CommandRegistrar) -> Result<()> {
        info!("Adding commands...");
        for definition in &self.definitions {
            let command = registrar.create(definition).await.map_err(|e| {
                error!("Cannot create '{}' command: {e}", definition.name);
                BotError::CommandSync {
                    action: "create",
                    name: definition.name.to_string(),
                    source: Box::new(e),
                }
            })?;
            info!("Registered command '{}' ({})", command.name, command.id);
            self.registered.push(command);
        }
        Ok(())
    }

    /// Deletes every registered command, stopping at the first failure.
    ///
    /// Returns the number of commands deleted.
    pub async fn unregister_all(&mut self, registrar: &impl CommandRegistrar) -> Result<usize> {
        info!("Removing commands...");
        let mut deleted = 0;
        while let Some(command) = self.registered.first() {
            registrar.delete(command).await.map_err(|e| {
                error!("Cannot delete '{}' command: {e}", command.name);
                BotError::CommandSync {
                    action: "delete",
                    name: command.name.clone(),
                    source: Box::new(e),
                }
            })?;
            self.registered.remove(0);
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Shutdown cleanup: removes the registered commands only when asked to.
    pub async fn teardown(
        &mut self,
        registrar: &impl CommandRegistrar,
        remove_commands: bool,
    ) -> Result<usize> {
        if !remove_commands {
            info!("Keeping {} registered command(s)", self.registered.len());
            return Ok(0);
        }
        self.unregister_all(registrar).await
    }
}
