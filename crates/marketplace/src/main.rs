use {
    anyhow::{Context, Result, bail},
    clap::Parser,
    marketplace::{
        Marketplace, MintRequest,
        arguments::{Arguments, Command},
        config::Config,
        session::WalletSession,
    },
    model::DisplayNft,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();
    observe::tracing::initialize(&args.log_filter);
    observe::metrics::setup_registry(Some("marketplace".into()), None);
    tracing::info!(config = %args.config.display(), "starting marketplace client");

    let config = Config::load(&args.config)?;
    let session = match &args.private_key {
        Some(key) => WalletSession::connect(
            &config.node_url,
            key.parse().context("invalid private key")?,
        ),
        None => WalletSession::read_only(&config.node_url),
    };
    let marketplace = Marketplace::new(&config, session);

    match args.command {
        Command::Listings => print_nfts(&marketplace.browse().await?)?,
        // Browsing owned or listed items without a wallet would query
        // the zero address and show nothing.
        Command::Owned => {
            require_wallet(&args.private_key)?;
            print_nfts(&marketplace.owned().await?)?
        }
        Command::Listed => {
            require_wallet(&args.private_key)?;
            print_nfts(&marketplace.listed().await?)?
        }
        Command::Mint {
            name,
            description,
            image,
            price,
        } => {
            require_wallet(&args.private_key)?;
            let receipt = marketplace
                .mint(MintRequest {
                    name,
                    description,
                    image,
                    price,
                })
                .await?;
            tracing::info!(tx = %receipt.transaction_hash, "token minted and listed");
        }
        Command::Resell { token_id, price } => {
            require_wallet(&args.private_key)?;
            let owned = marketplace.owned().await?;
            let nft = owned
                .iter()
                .find(|nft| nft.token_id == token_id)
                .with_context(|| format!("token {token_id} is not owned by this wallet"))?;
            let receipt = marketplace.resell(nft, &price).await?;
            tracing::info!(tx = %receipt.transaction_hash, "token listed for resale");
        }
        Command::Buy { token_id } => {
            require_wallet(&args.private_key)?;
            let listings = marketplace.browse().await?;
            let nft = listings
                .iter()
                .find(|nft| nft.token_id == token_id)
                .with_context(|| format!("token {token_id} is not listed for sale"))?;
            let receipt = marketplace.buy(nft).await?;
            tracing::info!(tx = %receipt.transaction_hash, "token purchased");
        }
    }
    Ok(())
}

fn require_wallet(private_key: &Option<String>) -> Result<()> {
    if private_key.is_none() {
        bail!("this command requires --private-key");
    }
    Ok(())
}

fn print_nfts(nfts: &[DisplayNft]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(nfts)?);
    Ok(())
}
