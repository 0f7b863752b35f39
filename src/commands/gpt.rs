//! The `/gpt` command: relay a prompt to the completion API.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::completion::Completer;
use crate::error::{BotError, Result};
use crate::interaction::{CommandEvent, ReplyEmbed, ResponseEdit};

use super::CommandFuture;

pub const PROMPT_OPTION: &str = "prompt";
pub const PLACEHOLDER: &str = "Sending prompt...";
pub const EMBED_TITLE: &str = "Disco GPT";
pub const EMBED_COLOR: u32 = 0x00ff00;
pub const FAILURE_NOTICE: &str = "Something went wrong";

// Discord rejects message content over 2000 and embed descriptions over 4096 characters.
const MAX_CONTENT_CHARS: usize = 2000;
const MAX_DESCRIPTION_CHARS: usize = 4096;

#[derive(Debug, Clone)]
pub struct GptSettings {
    pub model: String,
    pub timeout: Duration,
}

/// Shared, read-only state handed to every `/gpt` invocation.
pub struct GptState<C> {
    pub completer: C,
    pub settings: GptSettings,
}

/// Dispatcher entry point for `/gpt`.
pub fn gpt<E: CommandEvent, C: Completer>(event: E, state: Arc<GptState<C>>) -> CommandFuture {
    Box::pin(async move {
        respond(event, state).await?;
        Ok(())
    })
}

/// Acknowledges the interaction and spawns the completion task.
///
/// Returns the spawned task, or `None` when the interaction was rejected.
pub async fn respond<E: CommandEvent, C: Completer>(
    event: E,
    state: Arc<GptState<C>>,
) -> Result<Option<JoinHandle<()>>> {
    let Some(prompt) = event.string_option(PROMPT_OPTION) else {
        let err = BotError::MissingOption(PROMPT_OPTION.to_string());
        warn!("Rejecting /gpt interaction: {err}");
        event.acknowledge(err.user_message()).await?;
        return Ok(None);
    };

    event.acknowledge(PLACEHOLDER.to_string()).await?;
    debug!("Acknowledged /gpt interaction");

    Ok(Some(tokio::spawn(complete_and_edit(event, state, prompt))))
}

async fn complete_and_edit<E: CommandEvent, C: Completer>(
    event: E,
    state: Arc<GptState<C>>,
    prompt: String,
) {
    let settings = &state.settings;
    let outcome = tokio::time::timeout(
        settings.timeout,
        state.completer.complete(&prompt, &settings.model),
    )
    .await
    .unwrap_or(Err(BotError::CompletionTimeout(settings.timeout)));

    let description = match outcome {
        Ok(text) => {
            info!("Completion returned {} characters", text.len());
            text
        }
        Err(e) => {
            error!("Completion failed for /gpt prompt: {e}");
            e.user_message()
        }
    };

    let edit = ResponseEdit {
        content: clip(&format!("> Prompt: {prompt}"), MAX_CONTENT_CHARS),
        embed: ReplyEmbed {
            title: EMBED_TITLE.to_string(),
            description: clip(&description, MAX_DESCRIPTION_CHARS),
            color: EMBED_COLOR,
        },
    };

    if let Err(e) = event.edit_response(edit).await {
        error!("Failed to edit /gpt response: {e}");
        if let Err(e) = event.follow_up(FAILURE_NOTICE.to_string()).await {
            debug!("Failed to send follow-up message: {e}");
        }
    }
}

/// Truncates `text` to at most `max_chars` characters, ending with an ellipsis when cut.
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().nth(max_chars).is_none() {
        return text.to_string();
    }
    let keep: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{keep}…")
}
