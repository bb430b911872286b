use crate::{
    slot::ChipValue,
    wallets,
    withdrawal::{
        api::DEFAULT_PRICE_API_URL,
        receipts::{
            NetworkEnv,
            WITHDRAWALS_ROOT,
        },
    },
};
use clap::{
    ArgGroup,
    Parser,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::{
    path::PathBuf,
    time::Duration,
};

pub const DEFAULT_MAINNET_API_URL: &str = "https://api.marquis.gg";
pub const DEFAULT_SEPOLIA_API_URL: &str = "https://sepolia-api.marquis.gg";
pub const DEFAULT_LOCAL_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_CHIPS: [u64; 5] = [1, 5, 25, 100, 500];
pub const DEFAULT_LOG_DIR: &str = ".logs";

#[derive(Parser, Debug)]
#[command(
    name = "roulette-table",
    version,
    about = "Terminal roulette betting table with token withdrawals",
    long_about = None,
    group(
        ArgGroup::new("network")
            .args(["mainnet", "sepolia", "local"])
            .required(true)
    )
)]
pub struct Args {
    #[arg(long)]
    mainnet: bool,

    #[arg(long)]
    sepolia: bool,

    #[arg(long)]
    local: bool,

    /// Override the platform API URL of the selected network
    #[arg(long)]
    api_url: Option<String>,

    #[arg(long, default_value = DEFAULT_PRICE_API_URL)]
    price_api_url: String,

    /// Account descriptor to connect for withdrawals
    #[arg(long)]
    wallet: Option<String>,

    /// Directory of account descriptors (defaults to ~/.starkli-wallets)
    #[arg(long)]
    wallet_dir: Option<String>,

    /// Comma separated chip denominations
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_CHIPS)]
    chips: Vec<u64>,

    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    #[arg(long, default_value = WITHDRAWALS_ROOT)]
    withdrawals_dir: PathBuf,

    #[arg(long, default_value_t = 60)]
    price_poll_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkEnv,
    pub api_url: String,
    pub price_api_url: String,
    pub wallet: Option<WalletConfig>,
    /// Where account descriptors are looked up, with or without `--wallet`.
    pub wallet_dir: PathBuf,
    pub denominations: Vec<ChipValue>,
    pub log_dir: PathBuf,
    pub withdrawals_dir: PathBuf,
    pub price_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let (network, default_url) = if args.mainnet {
            (NetworkEnv::Mainnet, DEFAULT_MAINNET_API_URL)
        } else if args.sepolia {
            (NetworkEnv::Sepolia, DEFAULT_SEPOLIA_API_URL)
        } else {
            (NetworkEnv::Local, DEFAULT_LOCAL_API_URL)
        };
        if args.chips.is_empty() {
            return Err(eyre!("--chips needs at least one denomination"));
        }
        if args.chips.len() > 9 {
            return Err(eyre!("--chips supports at most 9 denominations"));
        }
        let denominations = args
            .chips
            .iter()
            .map(|value| {
                ChipValue::new(*value)
                    .map_err(|e| eyre!("invalid chip denomination {value}: {e}"))
            })
            .collect::<Result<Vec<_>>>()?;
        if args.price_poll_secs == 0 {
            return Err(eyre!("--price-poll-secs must be positive"));
        }
        let wallet_dir = wallets::resolve_wallet_dir(args.wallet_dir.as_deref())?;
        let wallet = args.wallet.map(|name| WalletConfig {
            name,
            dir: wallet_dir.clone(),
        });
        Ok(Self {
            network,
            api_url: args.api_url.unwrap_or_else(|| default_url.to_string()),
            price_api_url: args.price_api_url,
            wallet,
            wallet_dir,
            denominations,
            log_dir: args.log_dir,
            withdrawals_dir: args.withdrawals_dir,
            price_poll_interval: Duration::from_secs(args.price_poll_secs),
        })
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let args = Args::try_parse_from(args)?;
        Self::from_args(args)
    }
}
