//! km24-agent - KM24 monitoring filter validation
//!
//! Command-line front end over the platform gateway and the validator.
//! Results are printed as JSON on stdout, logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use km24_agent::filters::parse_assignment;
use km24_agent::{health, FilterSpec, Km24Client, PlatformGateway, Validator};
use km24_common::config::{load_dotenv, load_toml_config, ConfigOverrides, PlatformConfig};
use km24_common::logging::init_tracing;

/// Command-line arguments for km24-agent
#[derive(Parser, Debug)]
#[command(name = "km24-agent")]
#[command(about = "Validate KM24 monitoring filters against live platform data")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: <config dir>/km24/km24-agent.toml)
    #[arg(short, long, global = true, env = "KM24_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// KM24 API key (overrides KM24_API_KEY and the TOML file)
    #[arg(long, global = true, value_name = "KEY")]
    api_key: Option<String>,

    /// KM24 REST API root (overrides KM24_BASE_URL and the TOML file)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available modules
    Modules {
        /// Bypass the module cache
        #[arg(long)]
        refresh: bool,
    },
    /// Show a module with its filter parts
    Module { module_id: i64 },
    /// Validate a filter set against live data
    Validate {
        module_id: i64,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show sample hits for a filter set
    Hits {
        module_id: i64,
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum hits to return
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Search companies by name
    Companies { query: String },
    /// Report platform connectivity
    Health,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Filter as slug=value; repeat a slug to pass several values
    #[arg(short = 'f', long = "filter", value_name = "SLUG=VALUE", value_parser = parse_assignment)]
    filters: Vec<(String, String)>,

    /// Filters as a JSON object of slug to string or list of strings
    #[arg(long, value_name = "JSON")]
    filters_json: Option<String>,
}

impl FilterArgs {
    fn into_spec(self) -> km24_agent::Result<FilterSpec> {
        let mut spec = match self.filters_json {
            Some(raw) => FilterSpec::from_json(&raw)?,
            None => FilterSpec::new(),
        };
        for (slug, value) in self.filters {
            spec.push(slug, value);
        }
        Ok(spec)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before config so config loading is logged
    let log_level = init_tracing();

    let args = Args::parse();

    load_dotenv();
    let toml_config = load_toml_config(args.config.as_deref())?;
    log_level.apply(&toml_config.logging);

    info!("Starting km24-agent v{}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        api_key: args.api_key,
        base_url: args.base_url,
    };
    let platform_config = PlatformConfig::resolve(&toml_config, &overrides)?;
    info!("KM24 API: {}", platform_config.base_url);

    let gateway: Arc<dyn PlatformGateway> = Arc::new(Km24Client::new(&platform_config)?);
    let validator = Validator::new(Arc::clone(&gateway));

    match args.command {
        Command::Modules { refresh } => {
            let modules = gateway.list_modules(refresh).await?;
            print_json(modules.as_slice())?;
        }
        Command::Module { module_id } => {
            let module = gateway.get_module(module_id).await?;
            print_json(&module)?;
        }
        Command::Validate { module_id, filters } => {
            let filters = filters.into_spec()?;
            info!(module_id, "Validating {} filters", filters.len());
            let verdict = validator.validate(module_id, &filters).await?;
            print_json(&verdict)?;
        }
        Command::Hits {
            module_id,
            filters,
            limit,
        } => {
            let filters = filters.into_spec()?;
            info!(module_id, limit, "Searching hits");
            let hits = validator.search_hits(module_id, &filters, limit).await?;
            print_json(&hits)?;
        }
        Command::Companies { query } => {
            let companies = gateway.search_companies(&query).await?;
            print_json(&companies)?;
        }
        Command::Health => {
            let report = health::check(gateway.as_ref()).await;
            print_json(&report)?;
        }
    }

    Ok(())
}
