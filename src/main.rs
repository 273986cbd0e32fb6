use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
mod auth;
use pinseal::{EncryptedPayload, Storage, TimestampStatus, default_storage};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

const INCORRECT_PIN: &str = "incorrect PIN";

fn resolve_storage(path: Option<PathBuf>) -> Result<Storage> {
    match path {
        Some(p) => Ok(Storage::new(p)),
        None => default_storage(),
    }
}

fn load_existing(storage: &Storage) -> Result<EncryptedPayload> {
    if !storage.exists() {
        bail!("no payload at {}", storage.path().display());
    }
    storage.load_payload()
}

#[derive(Debug, Parser)]
#[command(name = "pinseal")]
#[command(
    version,
    about = "PIN-protected storage for wallet recovery material."
)]
struct Cli {
    /// Path to the payload file
    #[arg(long, global = true, value_name = "PATH", env = "PINSEAL_PATH")]
    payload: Option<PathBuf>,

    /// Log at debug level (overrides PINSEAL_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a secret under a new PIN
    Encrypt {
        /// Secret to encrypt; read from stdin or a prompt when omitted
        secret: Option<String>,

        /// Replace an existing payload
        #[arg(long)]
        force: bool,
    },

    /// Prints the decrypted secret
    Decrypt,

    /// Checks a PIN without printing the secret
    Verify,

    /// Re-encrypts the secret under a new PIN and the latest scheme
    Rekey,

    /// Shows payload metadata; no PIN required
    Info,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PINSEAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_logging(args.verbose);
    run(args)?;
    Ok(())
}

fn run(args: Cli) -> Result<()> {
    let storage = resolve_storage(args.payload)?;
    info!(path = %storage.path().display(), "using payload file");

    match args.command {
        Commands::Encrypt { secret, force } => {
            if storage.exists() && !force {
                bail!(
                    "payload already exists at {} (use --force to replace it)",
                    storage.path().display()
                );
            }
            let secret = match secret {
                Some(secret) => Zeroizing::new(secret),
                None => auth::read_secret()?,
            };
            let pin = auth::read_new_pin(auth::PIN_ENV)?;
            let payload = pinseal::encrypt(&secret, &pin)?;
            storage.save_payload(&payload)?;
            println!("secret encrypted");
        }
        Commands::Decrypt => {
            let payload = load_existing(&storage)?;
            let pin = auth::read_pin()?;
            match pinseal::decrypt(&payload, &pin) {
                Ok(secret) => println!("{}", secret.as_str()),
                Err(_) => bail!(INCORRECT_PIN),
            }
        }
        Commands::Verify => {
            let payload = load_existing(&storage)?;
            let pin = auth::read_pin()?;
            if !pinseal::verify_pin(&payload, &pin) {
                bail!(INCORRECT_PIN);
            }
            println!("PIN is correct");
        }
        Commands::Rekey => {
            let payload = load_existing(&storage)?;
            let pin = auth::read_pin()?;
            if !pinseal::verify_pin(&payload, &pin) {
                bail!(INCORRECT_PIN);
            }
            let new_pin = auth::read_new_pin(auth::NEW_PIN_ENV)?;
            let rekeyed = pinseal::reencrypt(&payload, &pin, &new_pin)?;
            storage.save_payload(&rekeyed)?;
            println!(
                "secret re-encrypted (version {} -> {})",
                u8::from(payload.version()),
                u8::from(rekeyed.version())
            );
        }
        Commands::Info => {
            let payload = load_existing(&storage)?;
            print_info(&payload);
        }
    }

    Ok(())
}

fn print_info(payload: &EncryptedPayload) {
    let version = payload.version();
    println!("Version:    {} ({})", u8::from(version), version.scheme());
    match payload.salt() {
        Some(salt) => println!("Salt:       {} bytes", salt.len()),
        None => println!("Salt:       fixed application salt"),
    }
    println!("IV:         {} bytes", payload.iv().len());
    println!("Ciphertext: {} bytes", payload.ciphertext().len());

    let created = payload
        .timestamp()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    let status = match payload.timestamp_status() {
        TimestampStatus::Unknown | TimestampStatus::Plausible => "",
        TimestampStatus::InFuture => " (in the future)",
        TimestampStatus::UnusuallyOld => " (unusually old)",
    };
    println!("Encrypted:  {created}{status}");

    if payload.needs_upgrade() {
        println!("Upgrade:    recommended, run `pinseal rekey`");
    }
}
