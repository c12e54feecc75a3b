use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use proto_faker::error::{Error, Result};
use proto_faker::{Config, Faker, ProtoFaker, Registry, SizeRange, TemplateContext};
use tracing_subscriber::EnvFilter;

/// Populate Protocol Buffer style messages with fake data.
///
/// Reads a JSON schema describing messages, enums and per-field generation
/// directives, and prints populated messages as JSON.
#[derive(Parser)]
#[command(name = "proto-faker", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate messages and print them as JSON.
    Generate {
        /// Schema file describing the messages.
        #[arg(long, env = "PROTO_FAKER_SCHEMA")]
        schema: PathBuf,

        /// Message to generate, by full name or name relative to the package.
        ///
        /// Example: --message example.User
        #[arg(long, env = "PROTO_FAKER_MESSAGE")]
        message: String,

        /// Number of messages to generate. More than one prints a JSON array.
        #[arg(long, default_value_t = 1, env = "PROTO_FAKER_COUNT")]
        count: usize,

        /// Seed for reproducible output. Random when omitted.
        #[arg(long, env = "PROTO_FAKER_SEED")]
        seed: Option<u64>,

        /// TOML configuration file. Flags override its values.
        #[arg(long, env = "PROTO_FAKER_CONFIG")]
        config: Option<PathBuf>,

        /// Maximum nesting depth of message fields.
        #[arg(long, env = "PROTO_FAKER_MAX_DEPTH")]
        max_depth: Option<usize>,

        /// Length range of generated strings (e.g., "4..10" or "8").
        #[arg(long, env = "PROTO_FAKER_STRING_SIZE")]
        string_size: Option<SizeRange>,

        /// Length range of generated bytes.
        #[arg(long, env = "PROTO_FAKER_BYTES_SIZE")]
        bytes_size: Option<SizeRange>,

        /// Element count range of repeated fields.
        #[arg(long, env = "PROTO_FAKER_LIST_SIZE")]
        list_size: Option<SizeRange>,

        /// Entry count range of map fields.
        #[arg(long, env = "PROTO_FAKER_MAP_SIZE")]
        map_size: Option<SizeRange>,

        /// strftime format used to parse timestamps from tags and templates.
        #[arg(long, env = "PROTO_FAKER_TIME_FORMAT")]
        time_format: Option<String>,

        /// Template data as key=value, reachable as {{ .key }}. Repeatable.
        #[arg(long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Print JSON on a single line.
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },

    /// Compile a schema and report what it defines.
    Check {
        /// Schema file to check.
        #[arg(long, env = "PROTO_FAKER_SCHEMA")]
        schema: PathBuf,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let quiet = match &cli.command {
        Commands::Generate { quiet, .. } | Commands::Check { quiet, .. } => *quiet,
    };
    init_tracing(quiet);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            message,
            count,
            seed,
            config,
            max_depth,
            string_size,
            bytes_size,
            list_size,
            map_size,
            time_format,
            data,
            compact,
            quiet: _,
        } => {
            let mut cfg = match &config {
                Some(path) => {
                    tracing::info!(path = %path.display(), "loading configuration");
                    Config::from_toml_file(path)?
                }
                None => Config::default(),
            };
            if let Some(depth) = max_depth {
                cfg.max_depth = depth;
            }
            if let Some(range) = string_size {
                cfg.string_size = range;
            }
            if let Some(range) = bytes_size {
                cfg.bytes_size = range;
            }
            if let Some(range) = list_size {
                cfg.list_size = range;
            }
            if let Some(range) = map_size {
                cfg.map_size = range;
            }
            if let Some(format) = time_format {
                cfg.time_format = format;
            }
            if !data.is_empty() {
                cfg.template = Some(template_data(&data)?);
            }

            tracing::info!(path = %schema.display(), "loading schema");
            let registry = Arc::new(Registry::from_path(&schema)?);

            let seed = seed.unwrap_or_else(rand::random);
            tracing::info!(seed, count, message = %message, "generating");
            let mut faker = ProtoFaker::with_config(Faker::seeded(seed), cfg)?;

            let mut generated = Vec::with_capacity(count);
            for _ in 0..count {
                generated.push(faker.fake_message(&registry, &message)?.to_json());
            }
            let output = if count == 1 {
                generated.pop().unwrap_or_default()
            } else {
                serde_json::Value::Array(generated)
            };

            let text = if compact {
                serde_json::to_string(&output)?
            } else {
                serde_json::to_string_pretty(&output)?
            };
            println!("{text}");
        }

        Commands::Check { schema, quiet } => {
            let registry = Registry::from_path(&schema)?;
            if !quiet {
                eprintln!(
                    "Schema OK: {} messages, {} enums, {} fields with directives",
                    registry.message_count(),
                    registry.enum_count(),
                    registry.directive_count()
                );
                for descriptor in registry.messages() {
                    eprintln!(
                        "  {} ({} fields, {} oneofs)",
                        descriptor.full_name,
                        descriptor.fields.len(),
                        descriptor.oneofs.len()
                    );
                    if !descriptor.description.is_empty() {
                        eprintln!("      {}", descriptor.description);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Parse repeated `key=value` flags into template data.
fn template_data(pairs: &[String]) -> Result<TemplateContext> {
    let mut context = TemplateContext::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::Config(format!(
                "--data expects key=value, got {pair:?}"
            )));
        };
        context = context.with_data(key.trim(), value);
    }
    Ok(context)
}
