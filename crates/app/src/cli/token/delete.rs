use clap::Args;
use tollgate_app::auth::OwnerUuid;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct DeleteTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Owner UUID the token belongs to
    #[arg(long)]
    owner_uuid: Uuid,

    /// Token UUID to delete
    #[arg(long, required_unless_present = "all")]
    token_uuid: Option<Uuid>,

    /// Delete every token the owner holds
    #[arg(long, conflicts_with = "token_uuid")]
    all: bool,
}

pub(crate) async fn run(args: DeleteTokenArgs) -> Result<(), String> {
    let (service, ctx) = super::connect(&args.database_url).await?;
    let owner = OwnerUuid::from_uuid(args.owner_uuid);

    match args.token_uuid {
        Some(token_uuid) => {
            service
                .delete_api_token(&ctx, owner, token_uuid.into())
                .await
                .map_err(|error| format!("failed to delete token: {error}"))?;

            println!("deleted token {token_uuid} if owned by {owner}");
        }
        None => {
            let deleted = service
                .delete_all_api_tokens_by_owner(&ctx, owner)
                .await
                .map_err(|error| format!("failed to delete tokens: {error}"))?;

            println!("deleted {deleted} tokens owned by {owner}");
        }
    }

    Ok(())
}
