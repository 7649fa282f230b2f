use clap::{Parser, Subcommand};
use postchain_rpc::{RestClient, RestConfig, RpcError};
use std::time::Duration;

mod commands;

/// Build, sign and post Postchain GTX transactions.
#[derive(Parser)]
#[command(name = "postchain-gtx")]
#[command(about = "Build, sign and post Postchain GTX transactions")]
#[command(version)]
struct Cli {
    /// Node REST URL.
    #[arg(long, default_value = "http://localhost:7740")]
    node_url: String,

    /// Blockchain RID (hex).
    #[arg(long)]
    brid: Option<String>,

    /// Resolve the blockchain RID from this chain IID when --brid is not given.
    #[arg(long)]
    chain_iid: Option<i64>,

    /// Request timeout in milliseconds (0 waits indefinitely).
    #[arg(long, default_value = "1000")]
    timeout_ms: u64,

    /// Delay between status polls in milliseconds.
    #[arg(long, default_value = "511")]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a secp256k1 key pair.
    Keygen,

    /// Build an unsigned transaction and print its payload.
    Build {
        /// Operation as a JSON array: '["transfer", [1000, "alice"]]'. Repeatable.
        #[arg(long = "operation", short = 'o')]
        operations: Vec<String>,

        /// Signer public key (hex). Repeatable; order fixes the signature slots.
        #[arg(long = "signer", short = 's')]
        signers: Vec<String>,
    },

    /// Print the digest every signer signs (also the transaction RID).
    Digest {
        /// Serialized transaction (hex).
        payload: String,
    },

    /// Sign a payload with a private key and print the updated payload.
    Sign {
        payload: String,

        /// Private key (hex).
        #[arg(long)]
        private_key: String,
    },

    /// Attach an externally produced signature.
    Attach {
        payload: String,

        /// Signer public key (hex).
        #[arg(long)]
        public_key: String,

        /// Signature (hex).
        #[arg(long)]
        signature: String,
    },

    /// Decode a payload and show its contents and signing state.
    Inspect { payload: String },

    /// Post a payload to the node.
    Send {
        payload: String,

        /// Return after posting instead of waiting for confirmation.
        #[arg(long)]
        no_wait: bool,
    },

    /// Run a read-only query.
    Query {
        /// Query name.
        name: String,

        /// Argument as key=value; the value is JSON, 0x-prefixed hex bytes, or text. Repeatable.
        #[arg(long = "arg", short = 'a')]
        args: Vec<String>,
    },

    /// Resolve the blockchain RID of a chain IID.
    Brid {
        /// Node-local chain IID.
        iid: i64,
    },
}

/// Application context shared across commands.
struct AppContext {
    rest: RestConfig,
    chain_iid: Option<i64>,
}

impl AppContext {
    fn from_cli(cli: &Cli) -> Self {
        let timeout = match cli.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self {
            rest: RestConfig {
                url: cli.node_url.clone(),
                blockchain_rid: cli.brid.clone(),
                timeout,
                poll_interval: Duration::from_millis(cli.poll_interval_ms),
            },
            chain_iid: cli.chain_iid,
        }
    }

    fn blockchain_rid(&self) -> Option<&str> {
        self.rest.blockchain_rid.as_deref()
    }

    /// A client bound to a chain: --brid, else --chain-iid, else `fallback`.
    async fn client(&self, fallback: Option<&str>) -> Result<RestClient, RpcError> {
        let mut client = RestClient::with_config(self.rest.clone())?;
        if client.blockchain_rid().is_none() {
            match (self.chain_iid, fallback) {
                (Some(iid), _) => {
                    client.initialize_brid_from_chain_id(iid).await?;
                }
                (None, Some(brid)) => client.set_blockchain_rid(brid),
                (None, None) => {}
            }
        }
        Ok(client)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = AppContext::from_cli(&cli);

    let result = match cli.command {
        Commands::Keygen => commands::keygen(),
        Commands::Build {
            operations,
            signers,
        } => commands::build(&ctx, &operations, &signers),
        Commands::Digest { payload } => commands::digest(&payload),
        Commands::Sign {
            payload,
            private_key,
        } => commands::sign(&payload, &private_key),
        Commands::Attach {
            payload,
            public_key,
            signature,
        } => commands::attach(&payload, &public_key, &signature),
        Commands::Inspect { payload } => commands::inspect(&payload),
        Commands::Send { payload, no_wait } => commands::send(&ctx, &payload, !no_wait).await,
        Commands::Query { name, args } => commands::query(&ctx, &name, &args).await,
        Commands::Brid { iid } => commands::brid(&ctx, iid).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
