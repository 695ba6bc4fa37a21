//! Praxos CLI - Command-line access to the Praxos knowledge-graph API

use clap::{Parser, Subcommand};
use colored::Colorize;
use praxos_client::{Client, ContextResult, Environment, SearchModality, SearchOptions, Source};
use praxos_core::{ClientConfig, ConfigFile, PraxosError};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "praxos")]
#[command(about = "Query and feed Praxos knowledge-graph environments", long_about = None)]
struct Cli {
    /// API key
    #[arg(long, global = true, env = "PRAXOS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "PRAXOS_BASE_URL")]
    base_url: Option<String>,

    /// TOML config file (api_key, base_url, timeout, [params])
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List environments
    Envs,

    /// Create an environment
    CreateEnv {
        /// Environment name
        name: String,
    },

    /// List sources in an environment
    Sources {
        /// Environment id or name
        #[arg(long)]
        env: String,
    },

    /// Upload a PDF or JSON file as a source
    AddFile {
        /// Environment id or name
        #[arg(long)]
        env: String,
        /// File to upload
        path: PathBuf,
        /// Source name (default: file name without extension)
        #[arg(long)]
        name: Option<String>,
        /// Source description
        #[arg(long)]
        description: Option<String>,
    },

    /// Search an environment
    Search {
        /// Environment id or name
        #[arg(long)]
        env: String,
        /// Query text
        query: String,
        /// Search modality: fast, node_vec, vec_edge or type_vec
        #[arg(short, long, default_value = "fast")]
        modality: String,
        /// Number of hits
        #[arg(short = 'k', long, default_value_t = 10)]
        top_k: usize,
    },

    /// Fetch LLM context for a query
    Context {
        /// Environment id or name
        #[arg(long)]
        env: String,
        /// Query text
        query: String,
        /// Number of context hits
        #[arg(short = 'k', long, default_value_t = 1)]
        top_k: usize,
    },

    /// Show the processing status of a source
    Status {
        /// Environment id or name
        #[arg(long)]
        env: String,
        /// Source id
        source_id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(&cli);

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({ "code": e.code(), "message": e.to_string() });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error_json).unwrap_or_else(|_| e.to_string())
            );
        } else {
            eprintln!("{}: {}", "Error".red(), e);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> praxos_core::Result<()> {
    let client = Client::from_config(build_config(cli)?)?;
    let json = cli.json;

    let result = match &cli.command {
        Commands::Envs => cmd_envs(&client, json),
        Commands::CreateEnv { name } => cmd_create_env(&client, name, json),
        Commands::Sources { env } => cmd_sources(&client.get_environment(env)?, json),
        Commands::AddFile {
            env,
            path,
            name,
            description,
        } => cmd_add_file(
            &client.get_environment(env)?,
            path,
            name.as_deref(),
            description.as_deref(),
            json,
        ),
        Commands::Search {
            env,
            query,
            modality,
            top_k,
        } => cmd_search(&client.get_environment(env)?, query, modality, *top_k, json),
        Commands::Context { env, query, top_k } => {
            cmd_context(&client.get_environment(env)?, query, *top_k, json)
        }
        Commands::Status { env, source_id } => {
            cmd_status(&client.get_environment(env)?, source_id, json)
        }
    };

    client.close();
    result
}

/// Layer command-line flags over the config file, if any.
fn build_config(cli: &Cli) -> praxos_core::Result<ClientConfig> {
    let mut file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    if let Some(api_key) = &cli.api_key {
        file.api_key = Some(api_key.clone());
    }
    if let Some(base_url) = &cli.base_url {
        file.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = cli.timeout {
        file.timeout = Some(timeout);
    }
    if file.api_key.as_deref().map_or(true, str::is_empty) {
        return Err(PraxosError::Config(
            "API key is required (use --api-key, PRAXOS_API_KEY or --config)".to_string(),
        ));
    }
    file.into_config()
}

fn print_json(value: &Value) -> praxos_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_environment(env: &Environment<'_>) {
    println!("{} {}", env.id().cyan(), env.name().bold());
    println!("  {}: {}", "Created".blue(), env.created_at());
    if !env.description().is_empty() {
        println!("  {}: {}", "Description".blue(), env.description());
    }
}

fn print_source(source: &Source<'_>) {
    println!("{} {}", source.id().cyan(), source.name().bold());
    println!("  {}: {}", "Created".blue(), source.created_at());
    if !source.description().is_empty() {
        println!("  {}: {}", "Description".blue(), source.description());
    }
}

fn cmd_envs(client: &Client, json: bool) -> praxos_core::Result<()> {
    let envs = client.get_environments()?;
    if json {
        let records: Vec<_> = envs.iter().map(|e| e.record()).collect();
        return print_json(&serde_json::to_value(records)?);
    }
    if envs.is_empty() {
        println!("{}", "No environments".yellow());
    }
    for env in &envs {
        print_environment(env);
    }
    Ok(())
}

fn cmd_create_env(client: &Client, name: &str, json: bool) -> praxos_core::Result<()> {
    let env = client.create_environment(name)?;
    if json {
        return print_json(&serde_json::to_value(env.record())?);
    }
    println!("{} environment", "Created".green());
    print_environment(&env);
    Ok(())
}

fn cmd_sources(env: &Environment<'_>, json: bool) -> praxos_core::Result<()> {
    let sources = env.get_sources()?;
    if json {
        let records: Vec<_> = sources.iter().map(|s| s.record()).collect();
        return print_json(&serde_json::to_value(records)?);
    }
    if sources.is_empty() {
        println!("{} in {}", "No sources".yellow(), env.name());
    }
    for source in &sources {
        print_source(source);
    }
    Ok(())
}

fn cmd_add_file(
    env: &Environment<'_>,
    path: &std::path::Path,
    name: Option<&str>,
    description: Option<&str>,
    json: bool,
) -> praxos_core::Result<()> {
    let source = env.add_file(path, name, description)?;
    if json {
        return print_json(&serde_json::to_value(source.record())?);
    }
    println!("{} {}", "Uploaded".green(), path.display());
    print_source(&source);
    Ok(())
}

fn cmd_search(
    env: &Environment<'_>,
    query: &str,
    modality: &str,
    top_k: usize,
    json: bool,
) -> praxos_core::Result<()> {
    let modality: SearchModality = modality.parse()?;
    let hits = env.search(query, modality, &SearchOptions::top_k(top_k))?;
    if json {
        return print_json(&Value::Array(hits));
    }
    if hits.is_empty() {
        println!("{}", "No results".yellow());
    }
    for (i, hit) in hits.iter().enumerate() {
        let score = praxos_core::score_of(hit);
        println!("{} {}", format!("[{}]", i + 1).blue(), format!("{:.3}", score).green());
        println!("  {}", hit);
    }
    Ok(())
}

fn cmd_context(
    env: &Environment<'_>,
    query: &str,
    top_k: usize,
    json: bool,
) -> praxos_core::Result<()> {
    let contexts = env.get_context(query, top_k)?;
    if json {
        let value = match &contexts {
            ContextResult::Single(context) => serde_json::to_value(context)?,
            ContextResult::Many(list) => serde_json::to_value(list)?,
        };
        return print_json(&value);
    }
    for context in contexts.into_vec() {
        println!("{}", format!("{:.3}", context.score).green());
        if !context.sentence.is_empty() {
            println!("  {}", context.sentence);
        }
        println!("  {}", context.data);
    }
    Ok(())
}

fn cmd_status(env: &Environment<'_>, source_id: &str, json: bool) -> praxos_core::Result<()> {
    let source = env.get_source(Some(source_id), None)?;
    let status = source.get_status()?;
    if json {
        return print_json(&status);
    }
    println!("{} {}", source.id().cyan(), source.name().bold());
    match &status {
        Value::Object(fields) => {
            for (key, value) in fields {
                println!("  {}: {}", key.blue(), value);
            }
        }
        other => println!("  {}: {}", "Status".blue(), other),
    }
    Ok(())
}
