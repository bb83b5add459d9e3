//! Latchkey CLI (`lk`)
//!
//! 서버 없이 토큰/암호/키/봉투를 다루는 Operator 도구입니다.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use config::CliConfig;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "lk")]
#[command(author, version, about = "Latchkey CLI - Operator tool for bearer credentials", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(flatten)]
    config: CliConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue, inspect and verify claims tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Encrypt or decrypt with the AES passphrase
    Cipher {
        #[command(subcommand)]
        action: CipherAction,
    },

    /// Derive and check RSA keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Seal or open public-key envelopes
    Envelope {
        #[command(subcommand)]
        action: EnvelopeAction,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand enums
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a signed token
    Issue {
        /// Custom claim (repeatable), value parsed as JSON when possible
        #[arg(long = "claim", value_parser = commands::token::parse_pair)]
        claims: Vec<(String, serde_json::Value)>,

        /// Lifetime in seconds
        #[arg(long, env = "LK_TOKEN_TTL")]
        ttl: Option<i64>,

        /// Extra header field (repeatable)
        #[arg(long = "header", value_parser = commands::token::parse_pair)]
        headers: Vec<(String, serde_json::Value)>,
    },
    /// Decode a token without verifying it
    Inspect { token: String },
    /// Run the full gate pipeline against a token
    Verify {
        token: String,

        /// Evaluate at this Unix time instead of now
        #[arg(long)]
        at: Option<i64>,

        /// Required permission
        #[arg(long, env = "LK_PERMISSION_THRESHOLD", default_value_t = 2)]
        permission: i64,
    },
}

#[derive(Subcommand)]
enum CipherAction {
    /// Encrypt text
    Encrypt {
        text: String,
        #[arg(long)]
        mode: Option<String>,
        /// Hex `iv || ciphertext` instead of base64
        #[arg(long)]
        raw: bool,
    },
    /// Decrypt a blob
    Decrypt {
        blob: String,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Print the derived public key
    Public,
    /// Check a public key file against the private key
    Check { public_key_file: PathBuf },
}

#[derive(Subcommand)]
enum EnvelopeAction {
    /// Seal the derived public key
    Seal,
    /// Open and verify an envelope
    Open { token: String },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lk_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = &cli.config;
    let format = cli.format;
    let now = chrono::Utc::now().timestamp();

    // 명령 실행
    let output = match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Issue { claims, ttl, headers } => {
                format.scalar("token", &commands::token::issue(config, claims, ttl, headers, now)?)
            }
            TokenAction::Inspect { token } => {
                format.document(&commands::token::inspect(config, &token)?)
            }
            TokenAction::Verify { token, at, permission } => format.document(
                &commands::token::verify(config, &token, at.unwrap_or(now), permission)?,
            ),
        },

        Commands::Cipher { action } => match action {
            CipherAction::Encrypt { text, mode, raw } => format.scalar(
                "ciphertext",
                &commands::cipher::encrypt(config, &text, mode.as_deref(), raw)?,
            ),
            CipherAction::Decrypt { blob, mode, raw } => format.scalar(
                "plaintext",
                &commands::cipher::decrypt(config, &blob, mode.as_deref(), raw)?,
            ),
        },

        Commands::Key { action } => match action {
            KeyAction::Public => format.scalar("publicKey", &commands::key::public(config)?),
            KeyAction::Check { public_key_file } => {
                format.document(&commands::key::check(config, &public_key_file)?)
            }
        },

        Commands::Envelope { action } => match action {
            EnvelopeAction::Seal => format.scalar("token", &commands::envelope::seal(config)?),
            EnvelopeAction::Open { token } => {
                format.document(&commands::envelope::open(config, &token)?)
            }
        },
    };

    println!("{}", output);
    Ok(())
}
