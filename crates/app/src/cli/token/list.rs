use clap::Args;
use tollgate_app::auth::{ApiTokenOrder, ApiTokenQuery, OwnerUuid, Pagination};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ListTokensArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Only tokens owned by this owner UUID
    #[arg(long)]
    owner_uuid: Option<Uuid>,

    /// Only tokens presented under this nano-id
    #[arg(long)]
    owner_nano_id: Option<String>,

    /// Case-insensitive description substring
    #[arg(long)]
    description: Option<String>,

    /// Case-insensitive status substring
    #[arg(long)]
    status: Option<String>,

    #[arg(long, conflicts_with = "only_permanent")]
    only_ephemeral: bool,

    #[arg(long)]
    only_permanent: bool,

    /// Sort order, e.g. `created_at_desc` or `last_used_at_asc`
    #[arg(long, default_value = "created_at_desc")]
    order: String,

    #[arg(long)]
    page: Option<u64>,

    #[arg(long)]
    per_page: Option<u64>,
}

pub(crate) async fn run(args: ListTokensArgs) -> Result<(), String> {
    let (service, ctx) = super::connect(&args.database_url).await?;

    let query = ApiTokenQuery {
        owner_uuid: args.owner_uuid.map(OwnerUuid::from_uuid),
        owner_nano_id: args.owner_nano_id,
        description: args.description,
        status: args.status,
        only_ephemeral: args.only_ephemeral,
        only_permanent: args.only_permanent,
        order: ApiTokenOrder::from(args.order.as_str()),
        pagination: Pagination::new(args.page, args.per_page),
        ..ApiTokenQuery::default()
    };

    let page = service
        .list_api_tokens(&ctx, query)
        .await
        .map_err(|error| format!("failed to list tokens: {error}"))?;

    if page.items.is_empty() {
        println!("no tokens found");
        return Ok(());
    }

    for view in &page.items {
        let token = &view.token;

        println!("token_uuid: {}", token.uuid);
        println!("owner_uuid: {}", token.owner_uuid);
        println!(
            "owner_nano_id: {}",
            token.owner_nano_id.as_deref().unwrap_or("none")
        );
        println!("description: {}", token.description);
        println!("status: {}", token.status);
        println!("created: {} ({})", token.created_at, view.created_ago);
        println!(
            "last_used: {}",
            view.last_used_ago.as_deref().unwrap_or("never")
        );
        println!("expires: {}", view.expires_in.as_deref().unwrap_or("never"));
        println!();
    }

    println!(
        "page {} of {} ({} tokens, {} per page)",
        page.page, page.total_pages, page.total, page.per_page
    );

    Ok(())
}
