//! Slash-command interactions and the Discord calls that answer them.

use std::future::Future;
use std::sync::Arc;

use poise::serenity_prelude::{
    Colour, CommandInteraction, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    EditInteractionResponse, Http,
};

use crate::error::Result;

/// A single rich embed attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

/// Replacement content for an acknowledged interaction response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEdit {
    pub content: String,
    pub embed: ReplyEmbed,
}

/// A user-invoked slash command that can be answered.
///
/// Each invocation owns its own handle; clones refer to the same interaction.
pub trait CommandEvent: Clone + Send + Sync + 'static {
    fn command_name(&self) -> &str;

    /// Value of a string option, if the user supplied it.
    fn string_option(&self, name: &str) -> Option<String>;

    /// Sends the initial channel-message response.
    fn acknowledge(&self, content: String) -> impl Future<Output = Result<()>> + Send;

    /// Replaces the content of the initial response.
    fn edit_response(&self, edit: ResponseEdit) -> impl Future<Output = Result<()>> + Send;

    fn follow_up(&self, content: String) -> impl Future<Output = Result<()>> + Send;
}

/// A Discord application-command interaction bound to an HTTP client.
#[derive(Clone)]
pub struct DiscordInteraction {
    http: Arc<Http>,
    command: CommandInteraction,
}

impl DiscordInteraction {
    pub fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self { http, command }
    }
}

impl CommandEvent for DiscordInteraction {
    fn command_name(&self) -> &str {
        &self.command.data.name
    }

    fn string_option(&self, name: &str) -> Option<String> {
        self.command
            .data
            .options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_str())
            .map(str::to_owned)
    }

    async fn acknowledge(&self, content: String) -> Result<()> {
        let message = CreateInteractionResponseMessage::new().content(content);
        self.command
            .create_response(&self.http, CreateInteractionResponse::Message(message))
            .await?;
        Ok(())
    }

    async fn edit_response(&self, edit: ResponseEdit) -> Result<()> {
        let embed = CreateEmbed::new()
            .title(edit.embed.title)
            .description(edit.embed.description)
            .colour(Colour::new(edit.embed.color));
        let builder = EditInteractionResponse::new()
            .content(edit.content)
            .embed(embed);
        self.command.edit_response(&self.http, builder).await?;
        Ok(())
    }

    async fn follow_up(&self, content: String) -> Result<()> {
        let builder = CreateInteractionResponseFollowup::new().content(content);
        self.command.create_followup(&self.http, builder).await?;
        Ok(())
    }
}
