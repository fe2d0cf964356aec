//! The Discord frontend: gateway connection, slash-command registration, and
//! dispatch into [`AppState`] via `poise`.

use crate::config::Config;
use crate::engine::commands::AppState;
use crate::error::{AppError, AppResult};
use crate::store::Store;
use poise::serenity_prelude as serenity;
use tracing::{error, info};

pub type Context<'a> = poise::Context<'a, AppState, AppError>;

/// Decimal guild id of the invoking server.
///
/// Every command is `guild_only`, so a missing guild id only happens if
/// Discord dispatches outside that contract.
fn guild_id(ctx: &Context<'_>) -> AppResult<String> {
    ctx.guild_id()
        .map(|id| id.to_string())
        .ok_or_else(|| anyhow::anyhow!("Command invoked outside a guild").into())
}

/// 📝 Manage this server's to-do lists
#[poise::command(
    slash_command,
    subcommands(
        "add",
        "add_bulk",
        "list",
        "check",
        "uncheck",
        "clear",
        "list_create",
        "list_switch",
        "list_delete"
    ),
    guild_only
)]
pub async fn todo(_ctx: Context<'_>) -> Result<(), AppError> {
    Ok(())
}

/// Add a task to the current list.
#[poise::command(slash_command, guild_only)]
async fn add(
    ctx: Context<'_>,
    #[description = "The task to add"] task: String,
) -> Result<(), AppError> {
    let reply = ctx.data().add(&guild_id(&ctx)?, task).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Add multiple tasks in one go.
#[poise::command(slash_command, guild_only)]
async fn add_bulk(
    ctx: Context<'_>,
    #[description = "Tasks separated by the configured delimiter (default ;)"] tasks: String,
) -> Result<(), AppError> {
    let reply = ctx.data().add_bulk(&guild_id(&ctx)?, tasks).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Show the current todo list.
#[poise::command(slash_command, guild_only)]
async fn list(ctx: Context<'_>) -> Result<(), AppError> {
    let reply = ctx.data().list(&guild_id(&ctx)?).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Mark a task as done.
#[poise::command(slash_command, guild_only)]
async fn check(
    ctx: Context<'_>,
    #[description = "Task number as shown by /todo list"] index: i64,
) -> Result<(), AppError> {
    let reply = ctx.data().check(&guild_id(&ctx)?, index).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Mark a task as not done.
#[poise::command(slash_command, guild_only)]
async fn uncheck(
    ctx: Context<'_>,
    #[description = "Task number as shown by /todo list"] index: i64,
) -> Result<(), AppError> {
    let reply = ctx.data().uncheck(&guild_id(&ctx)?, index).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Clear the current list.
#[poise::command(slash_command, guild_only)]
async fn clear(ctx: Context<'_>) -> Result<(), AppError> {
    let reply = ctx.data().clear(&guild_id(&ctx)?).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Create a new todo list.
#[poise::command(slash_command, guild_only)]
async fn list_create(
    ctx: Context<'_>,
    #[description = "Name of the new list"] name: String,
) -> Result<(), AppError> {
    let reply = ctx.data().list_create(&guild_id(&ctx)?, name).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Switch to a different list.
#[poise::command(slash_command, guild_only)]
async fn list_switch(
    ctx: Context<'_>,
    #[description = "Name of the list to switch to"] name: String,
) -> Result<(), AppError> {
    let reply = ctx.data().list_switch(&guild_id(&ctx)?, name).await?;
    ctx.say(reply).await?;
    Ok(())
}

/// Delete a todo list.
#[poise::command(slash_command, guild_only)]
async fn list_delete(
    ctx: Context<'_>,
    #[description = "Name of the list to delete"] name: String,
) -> Result<(), AppError> {
    let reply = ctx.data().list_delete(&guild_id(&ctx)?, name).await?;
    ctx.say(reply).await?;
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, AppState, AppError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                command = %ctx.command().qualified_name,
                %error,
                "Command failed"
            );
            let _ = ctx.say("⚠️ Something went wrong. Please try again.").await;
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!(%e, "Error while handling error");
            }
        }
    }
}

/// Connect to Discord and serve commands until the gateway shuts down.
pub async fn start_bot() -> AppResult<()> {
    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // The token is the one required secret; refuse to start without it.
    let token = config.bot.resolve_token()?;

    if let Some(parent) = config.store.path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    info!("Loading store from {}...", config.store.path.display());
    let store = Store::load(&config.store.path)?;
    let state = AppState::new(config, store);

    let intents = serenity::GatewayIntents::non_privileged();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![todo()],
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(command = %ctx.command().qualified_name, "Handling command");
                })
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Bot logged in as {}", ready.user.name);
                info!("Commands synced.");
                Ok(state)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await;
    client?.start().await?;

    Ok(())
}
