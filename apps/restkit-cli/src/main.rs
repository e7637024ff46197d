use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openapi_gen::{Info, OpenApiBuilder, Server};
use query_core::{QueryParams, QueryTranslator};
use runtime::{AppConfig, CliArgs, Environment};
use std::path::{Path, PathBuf};

/// restkit - query translation and OpenAPI generation for REST services
#[derive(Parser)]
#[command(name = "restkit")]
#[command(about = "restkit - query translation and OpenAPI generation for REST services")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an OpenAPI document from a route table
    Openapi {
        /// Route table (.json, .yaml or .yml); overrides docs.routes
        #[arg(long)]
        routes: Option<PathBuf>,
        /// Target document; overrides docs.output
        #[arg(long)]
        out: Option<PathBuf>,
        /// Cargo manifest used for `info`; overrides docs.manifest
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Translate a query string and print the structured query as JSON
    Query {
        /// Raw query string, e.g. "age__gte=18&__order=-name"
        query: String,
        /// JSON object of equality filters
        #[arg(long = "where")]
        where_json: Option<String>,
    },
    /// Check configuration
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let env = Environment::load(&cwd).context("Failed to load environment")?;

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args, &env);

    // Relative log files live next to the config file.
    let base_dir = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.clone());
    runtime::init_logging_from_config(&config.logging_or_default(&env), &base_dir);
    tracing::debug!(env = %env.env, "restkit starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Openapi {
            routes,
            out,
            manifest,
        } => generate_openapi(&config, routes, out, manifest),
        Commands::Query { query, where_json } => print_query(&config, &query, where_json),
        Commands::Check => check_config(&config, &env),
    }
}

fn generate_openapi(
    config: &AppConfig,
    routes: Option<PathBuf>,
    out: Option<PathBuf>,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let docs = &config.docs;
    let routes = routes
        .or_else(|| docs.routes.clone())
        .context("No route table given (use --routes or docs.routes)")?;
    let out = out
        .or_else(|| docs.output.clone())
        .context("No output document given (use --out or docs.output)")?;

    let table = openapi_gen::load_route_table(&routes)
        .with_context(|| format!("Failed to load routes from {}", routes.display()))?;

    let mut builder = OpenApiBuilder::new(docs.openapi_version.clone());
    if let Some(info) = &docs.info {
        builder = builder.with_info(Info {
            title: info.title.clone(),
            description: info.description.clone(),
            version: info.version.clone(),
        });
    } else if let Some(manifest) = manifest.or_else(|| docs.manifest.clone()) {
        builder = builder
            .with_info_from_manifest(&manifest)
            .with_context(|| format!("Failed to read {}", manifest.display()))?;
    }
    for server in &docs.servers {
        builder = builder.add_server(Server {
            url: server.url.clone(),
            description: server.description.clone(),
        });
    }

    let doc = builder.add_routes(&table).build();
    openapi_gen::dump(&out, &doc)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Wrote {} ({} paths)", out.display(), doc.paths.len());
    Ok(())
}

fn print_query(config: &AppConfig, raw: &str, where_json: Option<String>) -> Result<()> {
    let translator = QueryTranslator::new(config.query.clone());
    let mut query = translator.translate(&QueryParams::parse(raw))?;
    if let Some(where_json) = where_json {
        query = query.with_where_json(&where_json)?;
    }

    println!("{}", serde_json::to_string_pretty(&query)?);
    Ok(())
}

fn check_config(config: &AppConfig, env: &Environment) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(routes) = &config.docs.routes {
        let table = openapi_gen::load_route_table(routes)
            .with_context(|| format!("Invalid route table {}", routes.display()))?;
        tracing::info!(routes = table.len(), "route table is readable");
    }
    if let Some(out) = &config.docs.output {
        openapi_gen::DocumentFormat::from_path(out)?;
    }

    println!("Configuration check passed");
    println!("Environment: {} (port {})", env.env, env.port);
    println!("{}", config.to_yaml()?);
    Ok(())
}
