//! Discord bot lifecycle and event handling.

use std::sync::Arc;

use log::{debug, error, info, warn};
use poise::{
    Framework, FrameworkOptions,
    serenity_prelude::{ClientBuilder, Context, FullEvent, GatewayIntents, Interaction},
};

use crate::commands::{
    CommandDispatcher, CommandName, CommandRegistry, DiscordRegistrar, GptSettings, GptState,
    command_definitions, gpt,
};
use crate::completion::OpenAiClient;
use crate::config::Config;
use crate::error::Result;
use crate::interaction::DiscordInteraction;

pub struct Data {
    dispatcher: CommandDispatcher<DiscordInteraction, GptState<OpenAiClient>>,
}

/// Run the Discord bot until Ctrl+C.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing completion client");
    let completer = OpenAiClient::new(config.openai_api_key.clone(), &config.openai_base_url)?;
    let state = Arc::new(GptState {
        completer,
        settings: GptSettings {
            model: config.openai_model.clone(),
            timeout: config.completion_timeout,
        },
    });
    let data = Data {
        dispatcher: CommandDispatcher::new(state)
            .with_handler(CommandName::Gpt, gpt::<DiscordInteraction, OpenAiClient>),
    };

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("Logged in as: {}", ready.user.tag());
                Ok(data)
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(&config.discord_token, GatewayIntents::non_privileged())
        .framework(framework)
        .await?;

    let http = Arc::clone(&client.http);
    let application = http.get_current_application_info().await.map_err(|e| {
        error!("Cannot fetch application info, check DISCORD_TOKEN: {e}");
        e
    })?;
    http.set_application_id(application.id);

    let registrar = DiscordRegistrar::new(http, config.guild_id);
    let mut registry = CommandRegistry::new(command_definitions());

    info!("Starting Discord client");
    tokio::select! {
        result = client.start() => {
            result?;
            warn!("Discord client stopped without a shutdown signal");
        }
        result = register_and_wait(&mut registry, &registrar) => result?,
    }

    let cleanup = registry.teardown(&registrar, config.remove_commands).await;
    client.shard_manager.shutdown_all().await;

    let removed = cleanup?;
    debug!("Removed {removed} command(s)");
    info!("Gracefully shutting down.");
    Ok(())
}

async fn register_and_wait(
    registry: &mut CommandRegistry,
    registrar: &DiscordRegistrar,
) -> Result<()> {
    registry.register_all(registrar).await?;

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, shutting down...");
    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> Result<()> {
    if let FullEvent::InteractionCreate {
        interaction: Interaction::Command(command),
    } = event
    {
        info!(
            "Received /{} from {} in channel {}",
            command.data.name,
            command.user.tag(),
            command.channel_id
        );

        let interaction = DiscordInteraction::new(Arc::clone(&ctx.http), command.clone());
        if let Some(handler) = data.dispatcher.dispatch(interaction)
            && let Err(e) = handler.await
        {
            error!("Error handling /{}: {e}", command.data.name);
        }
    }
    Ok(())
}
