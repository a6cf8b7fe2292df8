use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use traffic_extractor::config::DataSource;
use traffic_extractor::osm::{GraphProvider, OverpassClient, PbfExtracts, SignalProvider};
use traffic_extractor::traffic::SystemClock;
use traffic_extractor::{AppConfig, Error, FileSink, RunOutcome, TrafficExtractor, menu, server};

#[derive(Parser, Debug)]
#[command(
    name = "traffic-extractor",
    about = "Street network analysis and traffic estimation from OpenStreetMap"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pick a city from the configured list (default).
    Menu,
    /// Analyze one city.
    Analyze {
        /// Place name, e.g. "Cali, Colombia"
        #[arg(long)]
        city: String,
        /// Print the statistics record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze one city, then serve the results over HTTP.
    Serve {
        #[arg(long)]
        city: String,
        /// Address to listen on (defaults to the config's server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// List the configured cities.
    Cities,
}

enum Source {
    Overpass(OverpassClient),
    Pbf(PbfExtracts),
}

impl Source {
    fn open(config: &AppConfig) -> traffic_extractor::Result<Self> {
        Ok(match &config.source {
            DataSource::Overpass { url, timeout_secs } => {
                Source::Overpass(OverpassClient::new(url.as_str(), *timeout_secs)?)
            }
            DataSource::Pbf => Source::Pbf(PbfExtracts::new(&config.cities)),
        })
    }

    fn graphs(&self) -> &dyn GraphProvider {
        match self {
            Source::Overpass(client) => client,
            Source::Pbf(extracts) => extracts,
        }
    }

    fn signals(&self) -> &dyn SignalProvider {
        match self {
            Source::Overpass(client) => client,
            Source::Pbf(extracts) => extracts,
        }
    }
}

fn run_analysis(config: &AppConfig, city: &str) -> traffic_extractor::Result<RunOutcome> {
    let source = Source::open(config)?;
    let sink = FileSink::new(&config.output_dir);
    TrafficExtractor {
        city,
        config,
        graphs: source.graphs(),
        signals: source.signals(),
        clock: &SystemClock,
        sink: &sink,
    }
    .run()
}

/// Resolves to `None` if `interrupt` fires before `task` completes.
async fn until_interrupted<T>(task: impl Future<Output = T>, interrupt: impl Future) -> Option<T> {
    tokio::select! {
        value = task => Some(value),
        _ = interrupt => None,
    }
}

fn exit_interrupted() -> ! {
    eprintln!("\n\nAnalysis interrupted by user");
    // Blocking workers cannot be cancelled; don't wait for them.
    std::process::exit(130);
}

/// Runs the analysis on a blocking worker; `None` means it failed, after the
/// status has been printed. Progress goes to stderr, results to stdout.
async fn analyze(config: Arc<AppConfig>, city: String, json: bool) -> anyhow::Result<Option<RunOutcome>> {
    eprintln!("\nAnalyzing: {city}");
    eprintln!("This may take a few minutes...");

    let worker = {
        let config = Arc::clone(&config);
        let city = city.clone();
        tokio::task::spawn_blocking(move || run_analysis(&config, &city))
    };

    let Some(joined) = until_interrupted(worker, tokio::signal::ctrl_c()).await else {
        exit_interrupted();
    };

    let outcome = match joined.context("Analysis worker panicked")? {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("\nAnalysis of {city} failed: {e}");
            return Ok(None);
        }
    };

    outcome.write_console(&mut io::stdout().lock(), config.display_top_n, json)?;
    Ok(Some(outcome))
}

/// Shows the city menu on a blocking worker so Ctrl-C at the prompt is seen.
async fn choose_city(config: &AppConfig) -> anyhow::Result<Option<String>> {
    let cities: Vec<String> = config.city_names().map(str::to_string).collect();
    let prompt = tokio::task::spawn_blocking(move || {
        let cities: Vec<&str> = cities.iter().map(String::as_str).collect();
        menu::prompt(&mut io::stdin().lock(), &mut io::stdout(), &cities).map(str::to_string)
    });

    let Some(joined) = until_interrupted(prompt, tokio::signal::ctrl_c()).await else {
        exit_interrupted();
    };

    match joined.context("Menu worker panicked")? {
        Ok(city) => Ok(Some(city)),
        Err(e @ Error::InvalidSelection(_)) => {
            println!("{e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load(cli.config.as_deref())?);

    let outcome = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Cities => {
            for (i, city) in config.city_names().enumerate() {
                println!("{}. {city}", i + 1);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Menu => {
            println!("URBAN TRAFFIC EXTRACTOR");
            println!("{}", "=".repeat(50));
            println!("Road network analysis and traffic estimation");
            println!("{}", "=".repeat(50));

            let Some(city) = choose_city(&config).await? else {
                return Ok(ExitCode::FAILURE);
            };
            analyze(Arc::clone(&config), city, false).await?
        }
        Commands::Analyze { city, json } => analyze(Arc::clone(&config), city, json).await?,
        Commands::Serve { city, bind } => {
            let Some(outcome) = analyze(Arc::clone(&config), city, false).await? else {
                return Ok(ExitCode::FAILURE);
            };
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            server::serve(outcome, &bind).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(if outcome.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
