//! certchain: Command-line tool for inspecting certificate chains.

use anyhow::{Context, Result};
use certchain_lib::{ChainReport, ExpirationThresholds, ReportOptions, ServiceState};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "certchain",
    about = "Classify certificate chain positions and report expiration status",
    long_about = "certchain reads a leaf-first certificate chain in PEM (or a single\n\
                  DER certificate) and reports the role of every certificate, its\n\
                  expiration status and whether it carries a weak signature.\n\n\
                  Self-signed detection verifies signatures, including MD5, SHA-1\n\
                  and ECDSA-SHA1 signatures, but does not validate trust.\n\
                  All commands read from stdin when no file is given.",
    after_help = "EXAMPLES:\n\
                  \n  certchain report chain.pem\
                  \n  certchain report --json chain.pem\
                  \n  certchain report --critical 7 --warning 21 chain.pem\
                  \n  certchain verify leaf.pem issuer.pem\
                  \n  cat chain.pem | certchain report"
)]
struct Cli {
    /// Log filter, e.g. "debug" or "certchain_lib=trace" (default: RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report chain positions and expiration status
    /// (exit code 0 = OK, 1 = WARNING, 2 = CRITICAL, 3 = UNKNOWN)
    #[command(after_help = "EXAMPLES:\n\
                      \n  certchain report chain.pem\
                      \n  certchain report --json chain.pem\
                      \n  certchain report --ignore-expiration chain.pem\
                      \n  certchain report --eval-root chain.pem")]
    Report {
        /// Certificate chain file, leaf first. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Days before expiration that are CRITICAL
        #[arg(long, default_value_t = 15)]
        critical: i64,
        /// Days before expiration that are WARNING
        #[arg(long, default_value_t = 30)]
        warning: i64,
        /// Report expired and expiring certificates without raising the state
        #[arg(long)]
        ignore_expiration: bool,
        /// Also flag weak signature algorithms on root certificates
        #[arg(long)]
        eval_root: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Check that ISSUER signed ISSUED (exit code 0 = verified, 2 = failed)
    #[command(after_help = "EXAMPLES:\n\
                      \n  certchain verify leaf.pem intermediate.pem\
                      \n  certchain verify root.pem root.pem")]
    Verify {
        /// Issued certificate (PEM or DER)
        issued: PathBuf,
        /// Candidate issuer certificate (PEM or DER)
        issuer: PathBuf,
    },
}

/// Maximum input size (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn exit_code(state: ServiceState) -> i32 {
    match state {
        ServiceState::Ok => 0,
        ServiceState::Warning => 1,
        ServiceState::Critical => 2,
        ServiceState::Unknown => 3,
    }
}

fn init_tracing(level: Option<&str>) {
    let env = match level {
        Some(lvl) => EnvFilter::new(lvl),
        None => EnvFilter::from_default_env(),
    };
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match &cli.command {
        Commands::Report {
            file,
            critical,
            warning,
            ignore_expiration,
            eval_root,
            json,
        } => {
            let options = ReportOptions {
                thresholds: ExpirationThresholds::new(*critical, *warning)?,
                ignore_expiration: *ignore_expiration,
                eval_root: *eval_root,
            };
            debug!(?options, "report options");

            let input = read_input(file.as_ref())?;
            let chain =
                certchain_lib::parse_chain(&input).context("Failed to parse certificate chain")?;
            let report = ChainReport::build(&chain, &options)?;

            if *json {
                println!("{}", certchain_lib::to_json(&report)?);
            } else {
                print!("{}", certchain_lib::display_text(&report));
            }

            let code = exit_code(report.summary.state);
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Verify { issued, issuer } => {
            let issued_cert = certchain_lib::parse_cert(&read_input(Some(issued))?)
                .with_context(|| format!("Failed to parse certificate: {}", issued.display()))?;
            let issuer_cert = certchain_lib::parse_cert(&read_input(Some(issuer))?)
                .with_context(|| format!("Failed to parse certificate: {}", issuer.display()))?;

            match certchain_lib::verify_signature(&issued_cert, &issuer_cert) {
                Ok(()) => println!("OK"),
                Err(e) => {
                    println!("FAIL: {}", e);
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}
