use {
    alloy::primitives::U256,
    clap::Parser,
    std::path::PathBuf,
};

/// Command line entry points mirroring the marketplace views.
#[derive(Debug, Parser)]
pub struct Arguments {
    /// Path to the configuration file.
    #[clap(long, env)]
    pub config: PathBuf,

    /// Tracing filter directive.
    #[clap(
        long,
        env,
        default_value = "warn,marketplace=debug,metadata=debug,ipfs=debug"
    )]
    pub log_filter: String,

    /// Hex encoded private key of the acting wallet. Browsing works
    /// without one.
    #[clap(long, env, hide_env_values = true)]
    pub private_key: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Show every item listed for sale.
    Listings,
    /// Show items owned by the wallet.
    Owned,
    /// Show items the wallet has listed for sale.
    Listed,
    /// Pin metadata for uploaded media and list the new token for sale.
    Mint {
        #[clap(long)]
        name: String,
        #[clap(long, default_value = "")]
        description: String,
        /// Url or content identifier of the media.
        #[clap(long)]
        image: String,
        /// Asking price in whole units of the native currency.
        #[clap(long)]
        price: String,
    },
    /// Re-list an owned token for sale.
    Resell {
        #[clap(long)]
        token_id: U256,
        #[clap(long)]
        price: String,
    },
    /// Buy a listed token at its asking price.
    Buy {
        #[clap(long)]
        token_id: U256,
    },
}
