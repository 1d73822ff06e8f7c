use clap::Args;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct RevokeTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Token UUID to revoke
    #[arg(long)]
    token_uuid: Uuid,
}

pub(crate) async fn run(args: RevokeTokenArgs) -> Result<(), String> {
    let (service, ctx) = super::connect(&args.database_url).await?;

    let token = service
        .revoke_api_token(&ctx, None, args.token_uuid.into())
        .await
        .map_err(|error| format!("failed to revoke token: {error}"))?;

    println!("revoked token {} (status {})", token.uuid, token.status);

    Ok(())
}
