use clap::Args;
use tollgate_app::auth::{NewApiToken, OwnerUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Owner UUID that should own the token
    #[arg(long)]
    owner_uuid: Uuid,

    /// Owner nano-id, used as the first segment of the bearer
    #[arg(long)]
    owner_nano_id: Option<String>,

    /// Label for the token; a codename is generated when omitted
    #[arg(long)]
    description: Option<String>,

    /// Lifetime in seconds; the token is permanent when omitted or zero
    #[arg(long)]
    ttl_seconds: Option<u64>,
}

pub(crate) async fn run(args: CreateTokenArgs) -> Result<(), String> {
    let (service, ctx) = super::connect(&args.database_url).await?;

    let issued = service
        .issue_api_token(
            &ctx,
            NewApiToken {
                owner_uuid: OwnerUuid::from_uuid(args.owner_uuid),
                owner_nano_id: args.owner_nano_id,
                description: args.description,
                ttl_seconds: args.ttl_seconds,
            },
        )
        .await
        .map_err(|error| format!("failed to create token: {error}"))?;

    println!("token_uuid: {}", issued.token.uuid);
    println!("owner_uuid: {}", issued.token.owner_uuid);
    println!("description: {}", issued.token.description);
    println!("created_at: {}", issued.token.created_at);
    if let Some(expires_at) = issued.token.lifetime.expires_at() {
        println!("expires_at: {expires_at}");
    }
    println!("api_token: {}", issued.bearer);
    println!("store this token now; it is only shown once");

    Ok(())
}
