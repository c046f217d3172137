mod config;
mod report;
mod serve;

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chainscope_advisor::{AnalysisEvent, Analyst, OpenAiClient, OpenAiConfig};
use chainscope_core::{compare_priorities, priority_score, Assessor, HistorySource};
use chainscope_sources::defillama::DEFAULT_PROTOCOL_LIMIT;
use chainscope_sources::{ChainDataService, ChainListClient, DefiLlamaClient, GitHubClient};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Blockchain integration complexity assessment.
#[derive(Parser)]
#[command(
    name = "chainscope",
    version,
    about = "Blockchain integration complexity assessment"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rule-based assessment of a chain
    Assess {
        /// Chain name, e.g. "Arbitrum"
        chain: String,
        /// Total value locked in USD (overrides discovered data)
        #[arg(long)]
        tvl: Option<f64>,
        /// TVL rank, 1 = largest (overrides discovered data)
        #[arg(long)]
        rank: Option<u32>,
        /// Number of DeFi protocols (overrides discovered data)
        #[arg(long)]
        protocols: Option<u32>,
        /// Mainnet is not live yet
        #[arg(long)]
        not_live: bool,
        /// Use the built-in catalogue only; no network lookups
        #[arg(long)]
        offline: bool,
    },

    /// AI-assisted analysis, streamed as it is generated
    Analyze {
        /// Chain name
        chain: String,
        /// Chat model (defaults to OPENAI_MODEL or gpt-4o)
        #[arg(long)]
        model: Option<String>,
        /// Use the built-in catalogue only for chain metadata
        #[arg(long)]
        offline: bool,
        /// Ask for the whole answer at once instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Compare the integration priority of two chains
    Compare {
        /// First chain name
        first: String,
        /// Second chain name
        second: String,
        /// Use the built-in catalogue only; no network lookups
        #[arg(long)]
        offline: bool,
    },

    /// List the largest DeFi protocols deployed on a chain
    Protocols {
        /// Chain name
        chain: String,
        /// Number of protocols to list
        #[arg(long, default_value_t = DEFAULT_PROTOCOL_LIMIT)]
        limit: usize,
        /// Skip the DeFiLlama lookup
        #[arg(long)]
        offline: bool,
    },

    /// Integration history mined from the wallet repository on GitHub
    Github {
        #[command(subcommand)]
        action: GithubAction,
        /// Refuse network access (the command then fails)
        #[arg(long, global = true)]
        offline: bool,
    },

    /// Print the complexity rule table
    Rules,

    /// Show integration history, or one chain's record
    History {
        /// Chain name
        chain: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Use the built-in catalogue only; no network lookups
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
enum GithubAction {
    /// Every chain family with its commit and PR activity
    Families,
    /// First-to-latest commit timeline for the family a chain maps to
    Timeline {
        /// Chain name
        chain: String,
    },
    /// Common files and average activity across families
    Patterns,
    /// Families and patterns together
    All,
}

fn init_tracing(serving: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if serving {
        "chainscope=info,tower_http=info"
    } else {
        "chainscope=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }), cli.quiet);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(cli.output, &e.to_string()),
    };

    match cli.command {
        Commands::Assess {
            chain,
            tvl,
            rank,
            protocols,
            not_live,
            offline,
        } => {
            let overrides = Overrides {
                tvl,
                rank,
                protocols,
                not_live,
            };
            let data = data_service(&config, offline);
            block_on(cli.output, cmd_assess(&chain, overrides, data, cli.output));
        }
        Commands::Analyze {
            chain,
            model,
            offline,
            no_stream,
        } => {
            let model = model.unwrap_or_else(|| config.openai.model.clone());
            let analyst = build_analyst(&config, offline)
                .with_model(model)
                .with_streaming(!no_stream);
            block_on(cli.output, cmd_analyze(&chain, analyst, cli.output, cli.quiet));
        }
        Commands::Compare {
            first,
            second,
            offline,
        } => {
            let data = data_service(&config, offline);
            block_on(cli.output, cmd_compare(&first, &second, data, cli.output));
        }
        Commands::Protocols {
            chain,
            limit,
            offline,
        } => {
            let data = data_service(&config, offline);
            block_on(cli.output, cmd_protocols(&chain, limit, data, cli.output));
        }
        Commands::Github { action, offline } => {
            let github = github_client(&config, offline);
            block_on(cli.output, cmd_github(action, github, cli.output));
        }
        Commands::Rules => cmd_rules(cli.output),
        Commands::History { chain } => cmd_history(chain.as_deref(), cli.output),
        Commands::Serve { port, offline } => {
            let options = serve::ServeOptions {
                port: port.unwrap_or(config.server.port),
                assessor: Assessor::new(HistorySource::seeded()),
                data: data_service(&config, offline),
                analyst: build_analyst(&config, offline),
                github: github_client(&config, offline),
                rate_limit: config.server.rate_limit,
                api_key: config.server.api_key.clone(),
                access_password: config.server.access_password.clone(),
            };
            block_on(cli.output, async {
                serve::start_server(options)
                    .await
                    .map_err(|e| format!("Server error: {}", e))
            });
        }
    }
}

/// Report `message` in the selected format and exit non-zero.
fn fail(output: OutputFormat, message: &str) -> ! {
    match output {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": message }));
        }
        OutputFormat::Text => eprintln!("error: {}", message),
    }
    process::exit(1);
}

fn block_on<F>(output: OutputFormat, future: F)
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(output, &format!("failed to create tokio runtime: {}", e)),
    };
    if let Err(message) = runtime.block_on(future) {
        fail(output, &message);
    }
}

fn data_service(config: &AppConfig, offline: bool) -> ChainDataService {
    if offline || config.sources.offline {
        ChainDataService::offline()
    } else {
        ChainDataService::new(
            Arc::new(ChainListClient::new(config.sources.chainlist_url.clone())),
            Arc::new(DefiLlamaClient::new(config.sources.defillama_url.clone())),
        )
    }
}

fn github_client(config: &AppConfig, offline: bool) -> Option<GitHubClient> {
    if offline || config.sources.offline {
        return None;
    }
    let settings = &config.github;
    Some(
        GitHubClient::new(settings.api_url.clone())
            .with_repository(settings.repository.clone(), settings.families_path.clone())
            .with_token(settings.token.clone()),
    )
}

fn build_analyst(config: &AppConfig, offline: bool) -> Analyst {
    let llm = OpenAiClient::new(OpenAiConfig {
        api_key: config.openai.api_key.clone(),
        base_url: config.openai.base_url.clone(),
        ..OpenAiConfig::default()
    });
    Analyst::new(
        Arc::new(llm),
        data_service(config, offline),
        Assessor::new(HistorySource::seeded()),
    )
    .with_model(config.openai.model.clone())
}

// ── assess ───────────────────────────────────────────────────────────

struct Overrides {
    tvl: Option<f64>,
    rank: Option<u32>,
    protocols: Option<u32>,
    not_live: bool,
}

async fn cmd_assess(
    chain: &str,
    overrides: Overrides,
    data: ChainDataService,
    output: OutputFormat,
) -> Result<(), String> {
    let chain = chain.trim();
    if chain.is_empty() {
        return Err("Chain name is required".to_string());
    }

    let profile = data.profile(chain).await;
    let mut snapshot = profile.snapshot(chain);
    if overrides.tvl.is_some() {
        snapshot.tvl = overrides.tvl;
    }
    if overrides.rank.is_some() {
        snapshot.rank = overrides.rank;
    }
    if overrides.protocols.is_some() {
        snapshot.protocols = overrides.protocols;
    }
    if overrides.not_live {
        snapshot.mainnet_live = Some(false);
    }

    let assessment = Assessor::new(HistorySource::seeded()).assess(snapshot);

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "chain": chain,
                "assessment": assessment,
                "chainData": profile,
            });
            let pretty = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            print!("{}", report::assessment_text(chain, &assessment));
            println!("\nChain data:");
            print!("{}", report::profile_text(&profile));
        }
    }
    Ok(())
}

// ── analyze ──────────────────────────────────────────────────────────

async fn cmd_analyze(
    chain: &str,
    analyst: Analyst,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), String> {
    let chain = chain.trim().to_string();
    if chain.is_empty() {
        return Err("Chain name is required".to_string());
    }

    let (tx, mut rx) = mpsc::channel(32);
    let session = async move { analyst.run(&chain, tx).await };
    let printer = async move {
        let mut failure = None;
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            if output == OutputFormat::Json {
                println!("{}", serde_json::to_string(&event).unwrap_or_default());
                if let AnalysisEvent::Error { error } = &event {
                    failure = Some(error.clone());
                }
                if terminal {
                    break;
                }
                continue;
            }
            match event {
                AnalysisEvent::Step { step, message } => {
                    if !quiet {
                        eprintln!("[{}/4] {}", step, message);
                    }
                }
                AnalysisEvent::Content { content } => {
                    if !quiet {
                        print!("{}", content);
                        let _ = stdout.flush();
                    }
                }
                AnalysisEvent::Result { analysis, .. } => {
                    if !quiet {
                        println!();
                    }
                    println!("\nComplexity:  {}", analysis.complexity);
                    println!("Timeframe:   {}", analysis.estimated_timeframe);
                    println!("Confidence:  {}%", analysis.confidence);
                    for flag in &analysis.red_flags {
                        println!("  ! {}", flag);
                    }
                    for item in &analysis.action_checklist {
                        println!("  - {}", item);
                    }
                }
                AnalysisEvent::Error { error } => failure = Some(error),
            }
            if terminal {
                break;
            }
        }
        failure
    };

    let ((), failure) = tokio::join!(session, printer);
    match failure {
        None => Ok(()),
        // Already on stdout as an error event.
        Some(_) if output == OutputFormat::Json => process::exit(1),
        Some(error) => Err(error),
    }
}

// ── compare / protocols ──────────────────────────────────────────────

async fn cmd_compare(
    first: &str,
    second: &str,
    data: ChainDataService,
    output: OutputFormat,
) -> Result<(), String> {
    let assessor = Assessor::new(HistorySource::seeded());
    let mut rows = Vec::with_capacity(2);
    for chain in [first.trim(), second.trim()] {
        if chain.is_empty() {
            return Err("Chain name is required".to_string());
        }
        let snapshot = data.profile(chain).await.snapshot(chain);
        let assessment = assessor.assess(snapshot.clone());
        let score = priority_score(assessment.complexity, &snapshot);
        rows.push((chain, assessment, score));
    }
    let verdict = compare_priorities(&rows[0].2, &rows[1].2);

    match output {
        OutputFormat::Json => {
            let chains: Vec<serde_json::Value> = rows
                .iter()
                .map(|(chain, assessment, score)| {
                    serde_json::json!({
                        "chain": chain,
                        "complexity": assessment.complexity,
                        "recommendedPriority": assessment.recommended_priority,
                        "priorityScore": score,
                    })
                })
                .collect();
            let value = serde_json::json!({ "chains": chains, "verdict": verdict });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            let table: Vec<_> = rows.iter().map(|(c, a, s)| (*c, a, s)).collect();
            print!("{}", report::comparison_text(&table, &verdict));
        }
    }
    Ok(())
}

async fn cmd_protocols(
    chain: &str,
    limit: usize,
    data: ChainDataService,
    output: OutputFormat,
) -> Result<(), String> {
    let chain = chain.trim();
    if chain.is_empty() {
        return Err("Chain name is required".to_string());
    }
    let protocols = data.top_protocols(chain, limit.max(1)).await;
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(
                &serde_json::json!({ "chain": chain, "protocols": protocols })
            )
            .unwrap_or_default()
        ),
        OutputFormat::Text => print!("{}", report::protocols_text(chain, &protocols)),
    }
    Ok(())
}

// ── github ───────────────────────────────────────────────────────────

async fn cmd_github(
    action: GithubAction,
    github: Option<GitHubClient>,
    output: OutputFormat,
) -> Result<(), String> {
    let github =
        github.ok_or_else(|| "GitHub analysis is unavailable in offline mode".to_string())?;
    let failed = |e: chainscope_sources::SourceError| format!("GitHub analysis failed: {}", e);
    let json = |value: serde_json::Value| {
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_default()
        )
    };

    match action {
        GithubAction::Families => {
            let families = github.families().await.map_err(failed)?;
            match output {
                OutputFormat::Json => json(serde_json::json!(families)),
                OutputFormat::Text => print!("{}", report::families_text(&families)),
            }
        }
        GithubAction::Timeline { chain } => {
            let chain = chain.trim();
            if chain.is_empty() {
                return Err("Chain name required for timeline".to_string());
            }
            let timeline = github
                .timeline(chain)
                .await
                .map_err(failed)?
                .ok_or_else(|| format!("No timeline found for {}", chain))?;
            match output {
                OutputFormat::Json => json(serde_json::json!(timeline)),
                OutputFormat::Text => print!("{}", report::timeline_text(&timeline)),
            }
        }
        GithubAction::Patterns => {
            let analysis = github.report().await.map_err(failed)?;
            match output {
                OutputFormat::Json => json(serde_json::json!(analysis.patterns)),
                OutputFormat::Text => print!("{}", report::patterns_text(&analysis.patterns)),
            }
        }
        GithubAction::All => {
            let analysis = github.report().await.map_err(failed)?;
            match output {
                OutputFormat::Json => json(serde_json::json!(analysis)),
                OutputFormat::Text => {
                    print!("{}", report::families_text(&analysis.families));
                    println!();
                    print!("{}", report::patterns_text(&analysis.patterns));
                }
            }
        }
    }
    Ok(())
}

// ── rules / history ──────────────────────────────────────────────────

fn cmd_rules(output: OutputFormat) {
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report::rules_json()).unwrap_or_default()
        ),
        OutputFormat::Text => print!("{}", report::rules_text()),
    }
}

fn cmd_history(chain: Option<&str>, output: OutputFormat) {
    let history = HistorySource::seeded();
    let Some(chain) = chain else {
        let stats = history.stats();
        match output {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&stats).unwrap_or_default()
            ),
            OutputFormat::Text => print!("{}", report::stats_text(&stats)),
        }
        return;
    };

    match history.record(chain) {
        Some(record) => match output {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&record).unwrap_or_default()
            ),
            OutputFormat::Text => print!("{}", report::record_text(&record)),
        },
        None => fail(output, &format!("no integration record for '{}'", chain)),
    }
}
