use std::sync::Arc;

use clap::{Args, Subcommand};
use tollgate_app::{auth::ApiTokensService, context::AppContext, store::Context};

mod activate;
mod create;
mod delete;
mod list;
mod revoke;

#[derive(Debug, Args)]
pub(crate) struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokenSubcommand {
    Create(create::CreateTokenArgs),
    List(list::ListTokensArgs),
    Revoke(revoke::RevokeTokenArgs),
    Activate(activate::ActivateTokenArgs),
    Delete(delete::DeleteTokenArgs),
}

pub(crate) async fn run(command: TokenCommand) -> Result<(), String> {
    match command.command {
        TokenSubcommand::Create(args) => create::run(args).await,
        TokenSubcommand::List(args) => list::run(args).await,
        TokenSubcommand::Revoke(args) => revoke::run(args).await,
        TokenSubcommand::Activate(args) => activate::run(args).await,
        TokenSubcommand::Delete(args) => delete::run(args).await,
    }
}

/// Connect, migrate and hand back the token service with a fresh call context.
async fn connect(database_url: &str) -> Result<(Arc<dyn ApiTokensService>, Context), String> {
    let app = AppContext::from_database_url(database_url, false)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    Ok((app.api_tokens, Context::background()))
}
