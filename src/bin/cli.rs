use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use webstore::engine::AesGcmCipher;
use webstore::{sdk, Encryption, Node, Store, StoreBuilder, StoreOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, env = "WEBSTORE_DATA_DIR", default_value = "data")]
    data_dir: String,

    /// JSON file with store options (prefix, type, defaults, ttl).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, env = "WEBSTORE_PREFIX")]
    prefix: Option<String>,

    /// Time-to-live of written entries, in milliseconds.
    #[arg(long)]
    ttl: Option<i64>,

    /// Hex-encoded 32-byte AES key; enables encryption.
    #[arg(long, env = "WEBSTORE_KEY", hide_env_values = true)]
    key_hex: Option<String>,

    /// Re-encrypt plain entries when they are read.
    #[arg(long, requires = "key_hex")]
    migrate: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Keys may be dotted paths (`user.profile.bio`) to reach nested values.
#[derive(Subcommand, Clone)]
enum Commands {
    Get { key: String },
    Set { key: String, value: String },
    Del { key: String },
    Has { key: String },
    Keys { key: Option<String> },
    Clear,
}

fn node<'a>(store: &'a Store, dotted: &str) -> Node<'a> {
    let mut segments = dotted.split('.');
    let root = store.entry(segments.next().unwrap_or_default());
    segments.fold(root, |node, segment| node.at(segment))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => StoreOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => StoreOptions::default(),
    };
    if let Some(prefix) = cli.prefix {
        options.prefix = prefix;
    }
    if cli.ttl.is_some() {
        options.ttl = cli.ttl;
    }

    let failed = Arc::new(AtomicBool::new(false));
    let flag = failed.clone();
    let mut builder = StoreBuilder::from_options(options).on_error(move |failure| {
        eprintln!("error: {}", failure);
        flag.store(true, Ordering::SeqCst);
    });
    if let Some(key_hex) = &cli.key_hex {
        builder = builder.encryption(Encryption::new(AesGcmCipher::from_hex(key_hex)?).migrate(cli.migrate));
    }

    let backends = sdk::new(&cli.data_dir)?;
    let store = builder.build(&backends);

    match cli.command {
        Commands::Get { key } => match node(&store, &key).get() {
            Some(val) => println!("{}", serde_json::to_string_pretty(&val)?),
            None => println!("undefined"),
        },
        Commands::Set { key, value } => {
            let val: Value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            node(&store, &key).set(val);
        }
        Commands::Del { key } => node(&store, &key).remove(),
        Commands::Has { key } => {
            let present = match key.rsplit_once('.') {
                Some((parent, property)) => node(&store, parent).has(property),
                None => store.has(&key),
            };
            println!("{}", present);
        }
        Commands::Keys { key } => {
            let keys = match key {
                Some(key) => node(&store, &key).keys(),
                None => store.keys(),
            };
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        Commands::Clear => store.clear_all(),
    }

    if failed.load(Ordering::SeqCst) {
        std::process::exit(1);
    }
    Ok(())
}
