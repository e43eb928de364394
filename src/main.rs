mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use credhash::{HashError, HashRecord, HasherConfig};
use tracing_subscriber::EnvFilter;

const EXIT_MISMATCH: u8 = 1;
const EXIT_MALFORMED: u8 = 2;

#[derive(Parser)]
#[command(
    name = "credhash",
    version,
    about = "Create and check salted, iterated credential hashes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print only the record or verdict
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Hash the secret exactly as typed, without Unicode NFC normalization
    #[arg(long, global = true)]
    no_normalize: bool,

    /// Log key-derivation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Hash a secret read from a hidden prompt
    Hash {
        #[arg(short, long, value_enum, default_value = "legacy")]
        scheme: Scheme,

        /// Override the preset's iteration (time) cost
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: Option<u32>,
    },

    /// Check a secret against a stored record
    Verify { record: String },

    /// Show a record's parameters and whether it should be re-hashed
    Inspect {
        record: String,

        #[arg(short, long, value_enum, default_value = "legacy")]
        scheme: Scheme,

        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: Option<u32>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum Scheme {
    Legacy,
    Standard,
    Paranoid,
}

impl Scheme {
    fn config(self, iterations: Option<u32>) -> HasherConfig {
        let mut config = match self {
            Scheme::Legacy => HasherConfig::LEGACY,
            Scheme::Standard => HasherConfig::STANDARD,
            Scheme::Paranoid => HasherConfig::PARANOID,
        };
        if let Some(iterations) = iterations {
            config.params = config.params.with_iterations(iterations);
        }
        config
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };
    let normalize = !cli.no_normalize;

    match cli.command {
        Command::Hash { scheme, iterations } => {
            let config = scheme.config(iterations);
            config.validate()?;

            let secret = ui::prompt_new_secret(normalize)?;

            let (encoded, elapsed) =
                ui::show_progress(options.unicode_support, "Hashing...", || {
                    Ok(credhash::create_with(&secret, &config)?)
                })?;
            let record = HashRecord::parse(&encoded)?;

            ui::display_created(&encoded, &record, elapsed, &options);
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { record } => {
            if let Err(e) = HashRecord::parse(&record) {
                return report_malformed(e);
            }

            let secret = ui::prompt_secret("Secret", normalize)?;

            let (matched, elapsed) =
                ui::show_progress(options.unicode_support, "Verifying...", || {
                    Ok(credhash::verify(&secret, &record)?)
                })?;

            ui::display_verdict(matched, elapsed, &options);
            Ok(if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_MISMATCH)
            })
        }
        Command::Inspect {
            record,
            scheme,
            iterations,
        } => {
            let parsed = match HashRecord::parse(&record) {
                Ok(parsed) => parsed,
                Err(e) => return report_malformed(e),
            };
            let target = scheme.config(iterations);
            let rehash = credhash::needs_rehash(&record, &target)?;

            ui::display_inspection(&parsed, &target, rehash, &options);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report_malformed(e: HashError) -> Result<ExitCode> {
    if e.is_malformed() {
        eprintln!("{e}");
        Ok(ExitCode::from(EXIT_MALFORMED))
    } else {
        Err(e.into())
    }
}
