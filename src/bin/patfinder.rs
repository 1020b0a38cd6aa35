//! Patfinder CLI: pharmaceutical patent discovery.
//!
//! Usage:
//!   patfinder search <molecule> [--brand B] [--country BR ...] [--config path] [--pretty] [--timeout secs]
//!   patfinder queries <molecule> [--brand B] [--config path]
//!   patfinder countries

use clap::{Parser, Subcommand};
use patfinder::query::Surface;
use patfinder::{CancellationToken, QueryContext, SearchConfig, SearchOrchestrator, SearchState};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Countries the search can resolve patents into.
const COUNTRIES: &[(&str, &str)] = &[
    ("AR", "Argentina"),
    ("AU", "Australia"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("EP", "European Patent Office"),
    ("IN", "India"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("PE", "Peru"),
    ("US", "United States"),
    ("UY", "Uruguay"),
];

const DEFAULT_COUNTRY: &str = "BR";

#[derive(Parser)]
#[command(
    name = "patfinder",
    version,
    about = "Pharmaceutical patent discovery across jurisdictions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full search and print the result as JSON
    Search {
        /// Molecule name (INN)
        molecule: String,
        /// Brand name
        #[arg(long)]
        brand: Option<String>,
        /// Target country code; repeatable
        #[arg(long = "country", short = 'c')]
        countries: Vec<String>,
        /// Path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
        /// Stop after this many seconds and print what was found so far
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the synthesized queries without searching
    Queries {
        molecule: String,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List supported country codes
    Countries,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("patfinder=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("patfinder=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<SearchConfig, String> {
    let path = match path {
        Some(path) => path,
        None => SearchConfig::default_path().map_err(|e| e.to_string())?,
    };
    SearchConfig::load(&path).map_err(|e| e.to_string())
}

/// Known codes from `requested`, upper-cased. Falls back to the default
/// country when none remain.
fn select_countries(requested: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for code in requested {
        let code = code.trim().to_ascii_uppercase();
        if !COUNTRIES.iter().any(|(c, _)| *c == code) {
            eprintln!("Warning: unknown country code '{}' ignored", code);
            continue;
        }
        if !selected.contains(&code) {
            selected.push(code);
        }
    }
    if selected.is_empty() {
        selected.push(DEFAULT_COUNTRY.to_string());
    }
    selected
}

fn context(molecule: &str, brand: Option<String>, countries: &[String]) -> QueryContext {
    let context = QueryContext::new(molecule).with_countries(countries);
    match brand {
        Some(brand) => context.with_brand(brand),
        None => context,
    }
}

async fn cmd_search(
    molecule: &str,
    brand: Option<String>,
    countries: &[String],
    config: Option<PathBuf>,
    pretty: bool,
    timeout: Option<u64>,
) -> i32 {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let orchestrator = match SearchOrchestrator::live(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let countries = select_countries(countries);
    let cancel = CancellationToken::new();
    let deadline = timeout.map(|secs| cancel.cancel_after(Duration::from_secs(secs)));
    let result = orchestrator
        .search_with(context(molecule, brand, &countries), SearchState::new(), &cancel)
        .await;
    if let Some(deadline) = deadline {
        deadline.abort();
    }

    let json = if pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if let Some(fault) = &result.fault {
        eprintln!("Warning: search incomplete: {:?}", fault);
        return 2;
    }
    0
}

async fn cmd_queries(molecule: &str, brand: Option<String>, config: Option<PathBuf>) -> i32 {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let orchestrator = match SearchOrchestrator::live(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let countries = select_countries(&[]);
    let (_, queries) = orchestrator.plan(&context(molecule, brand, &countries)).await;
    for query in queries.iter() {
        let surface = match query.surface {
            Surface::Registry => "registry",
            Surface::Web => "web",
        };
        println!("{:<8} {:<15} {}", surface, query.category.as_str(), query.text);
    }
    eprintln!("{} queries", queries.len());
    0
}

fn cmd_countries() -> i32 {
    for (code, name) in COUNTRIES {
        println!("{}  {}", code, name);
    }
    0
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Search {
            molecule,
            brand,
            countries,
            config,
            pretty,
            timeout,
        } => cmd_search(&molecule, brand, &countries, config, pretty, timeout).await,
        Commands::Queries {
            molecule,
            brand,
            config,
        } => cmd_queries(&molecule, brand, config).await,
        Commands::Countries => cmd_countries(),
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_dropped() {
        let selected = select_countries(&["br".into(), "XX".into(), "mx".into(), "BR".into()]);
        assert_eq!(selected, vec!["BR".to_string(), "MX".to_string()]);
    }

    #[test]
    fn empty_selection_defaults() {
        assert_eq!(select_countries(&[]), vec![DEFAULT_COUNTRY.to_string()]);
    }

    #[test]
    fn cli_parses_repeated_countries() {
        let cli = Cli::parse_from(["patfinder", "search", "darolutamide", "-c", "BR", "-c", "MX", "--pretty"]);
        match cli.command {
            Commands::Search { countries, pretty, .. } => {
                assert_eq!(countries, vec!["BR", "MX"]);
                assert!(pretty);
            }
            _ => panic!("expected search"),
        }
    }
}
