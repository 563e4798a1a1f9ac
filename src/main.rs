//! Layered Conf CLI
//!
//! Entry point for the `layered-conf` command-line tool.

use clap::{Parser, Subcommand};
use layered_conf::{
    load_environment, ConfError, Config, EnvironmentSnapshot, FileResolver, LayerFormat, Value,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "layered-conf")]
#[command(about = "Resolve environment-layered configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged configuration for an environment
    Show {
        /// Configuration root (must be absolute)
        #[arg(long, short = 'r')]
        root: PathBuf,

        /// Environment name (e.g. staging, test)
        #[arg(long, short = 'e')]
        env: String,

        /// Layer file format
        #[arg(long, short = 'f', default_value = "toml")]
        format: LayerFormat,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Print the contributing layers instead of the configuration
        #[arg(long)]
        sources: bool,
    },

    /// Print a single value as JSON
    Get {
        /// Configuration root (must be absolute)
        #[arg(long, short = 'r')]
        root: PathBuf,

        /// Environment name (e.g. staging, test)
        #[arg(long, short = 'e')]
        env: String,

        /// Layer file format
        #[arg(long, short = 'f', default_value = "toml")]
        format: LayerFormat,

        /// Value to print when the key is missing (JSON, or a raw string)
        #[arg(long, short = 'd')]
        default: Option<String>,

        /// Key to look up, nested with ':' (e.g. server:host)
        key: String,
    },

    /// List environments with a layer file
    Envs {
        /// Configuration root
        #[arg(long, short = 'r')]
        root: PathBuf,

        /// Layer file format
        #[arg(long, short = 'f', default_value = "toml")]
        format: LayerFormat,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            root,
            env,
            format,
            pretty,
            sources,
        } => {
            run_show(root, &env, format, pretty, sources);
        }
        Commands::Get {
            root,
            env,
            format,
            default,
            key,
        } => {
            run_get(root, &env, format, default, &key);
        }
        Commands::Envs { root, format } => {
            run_envs(root, format);
        }
    }
}

fn load(root: PathBuf, env: &str, format: LayerFormat) -> Config {
    let snapshot = EnvironmentSnapshot::from_process();
    match load_environment(&root, env, &FileResolver::new(format), &snapshot) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration ({}): {}", e.kind(), e);
            process::exit(1);
        }
    }
}

fn run_show(root: PathBuf, env: &str, format: LayerFormat, pretty: bool, sources: bool) {
    let config = load(root, env, format);

    let output = if sources {
        match config.provenance() {
            Some(provenance) => provenance.to_json(),
            None => Ok("null".to_string()),
        }
    } else if pretty {
        config.to_json_pretty()
    } else {
        Ok(config.to_json())
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_get(root: PathBuf, env: &str, format: LayerFormat, default: Option<String>, key: &str) {
    let config = load(root, env, format);

    let value = match default {
        Some(raw) => config.get_or(key, parse_default(&raw)),
        None => config.get(key).cloned(),
    };

    match value {
        Ok(value) => println!("{}", value.to_json()),
        Err(e @ ConfError::MissingKey { .. }) => {
            eprintln!("{}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error ({}): {}", e.kind(), e);
            process::exit(1);
        }
    }
}

fn run_envs(root: PathBuf, format: LayerFormat) {
    match FileResolver::new(format).list_environments(&root) {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
        }
        Err(e) => {
            eprintln!("Error listing environments: {}", e);
            process::exit(1);
        }
    }
}

/// Interpret a `--default` argument as JSON, falling back to a raw string
fn parse_default(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(raw),
    }
}
