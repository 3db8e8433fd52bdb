//! Rebeca LTL translator - Main binary

use clap::{Parser, Subcommand};
use rebeca_ltl::config::NbaTranslation;
use rebeca_ltl::operators::{BinaryOperator, UnaryOperator};
use rebeca_ltl::{
    BatchSource, BatchStats, DefinitionFailure, OwlEngine, RebecaTranslator, TranslatorConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rebeca-ltl")]
#[command(about = "Translate Rebeca property definitions into LTL formulas and automata")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate property definitions into labelled LTL formulas
    Translate {
        /// Compiled model file
        #[arg(short, long, value_name = "FILE")]
        model: PathBuf,

        /// Compiled property files, one batch each
        #[arg(short, long = "property", value_name = "FILE", required = true)]
        properties: Vec<PathBuf>,

        /// Output file (stdout when absent)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Translate property definitions into Büchi automata with Owl
    Nba {
        /// Compiled model file
        #[arg(short, long, value_name = "FILE")]
        model: PathBuf,

        /// Compiled property file
        #[arg(short, long, value_name = "FILE")]
        property: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// LTL-to-NBA construction
        #[arg(short, long, value_name = "TRANSLATION")]
        translation: Option<NbaTranslation>,

        /// Do not simplify formulas before translating
        #[arg(long)]
        skip_formula_simplifier: bool,

        /// Do not simplify the acceptance condition
        #[arg(long)]
        skip_acceptance_simplifier: bool,

        /// Do not use direct constructions for simple fragments
        #[arg(long)]
        skip_translation_portfolio: bool,

        /// Make automata complete
        #[arg(long)]
        complete: bool,

        /// Use state-based acceptance
        #[arg(long)]
        state_acceptance: bool,

        /// Translate without writing any output
        #[arg(long)]
        dry_run: bool,
    },

    /// Show translator information
    Info,
}

/// One labelled formula as written by `translate`
#[derive(Serialize)]
struct FormulaRecord<'a> {
    name: &'a str,
    formula: String,
    propositions: &'a [String],
}

/// One batch as written by `translate`
#[derive(Serialize)]
struct BatchRecord<'a> {
    property: &'a Path,
    formulas: Vec<FormulaRecord<'a>>,
    failures: &'a [DefinitionFailure],
    stats: &'a BatchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Load configuration
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Translate {
            model,
            properties,
            output,
        } => {
            translate_properties(config, model, properties, output).await?;
        }
        Commands::Nba {
            model,
            property,
            output,
            translation,
            skip_formula_simplifier,
            skip_acceptance_simplifier,
            skip_translation_portfolio,
            complete,
            state_acceptance,
            dry_run,
        } => {
            let mut config = config;
            if let Some(translation) = translation {
                config.engine.translation = translation;
            }
            config.engine.simplify_formula &= !skip_formula_simplifier;
            config.engine.simplify_acceptance &= !skip_acceptance_simplifier;
            config.engine.translation_portfolio &= !skip_translation_portfolio;
            config.engine.complete |= complete;
            config.engine.state_acceptance |= state_acceptance;
            config.output.dry_run |= dry_run;
            translate_to_nba(config, model, property, output).await?;
        }
        Commands::Info => {
            show_info(&config);
        }
    }

    Ok(())
}

/// Initialize logging
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("rebeca_ltl={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration
fn load_config(config_path: Option<PathBuf>) -> Result<TranslatorConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            TranslatorConfig::from_file(&path).map_err(|e| e.into())
        }
        None => {
            info!("Using default configuration");
            Ok(TranslatorConfig::default())
        }
    }
}

fn write_output(
    output: Option<&Path>,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("Output written to: {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Translate property files into labelled formulas
async fn translate_properties(
    config: TranslatorConfig,
    model: PathBuf,
    properties: Vec<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pretty = config.output.pretty_print;
    let dry_run = config.output.dry_run;
    let translator = RebecaTranslator::with_config(config);

    let sources: Vec<BatchSource> = properties
        .iter()
        .map(|property| BatchSource::new(&model, property))
        .collect();
    let outcomes = translator.translate_batches(sources).await;

    let records: Vec<BatchRecord> = properties
        .iter()
        .zip(&outcomes)
        .map(|(property, outcome)| BatchRecord {
            property,
            formulas: outcome
                .formulas
                .iter()
                .map(|definition| FormulaRecord {
                    name: &definition.name,
                    formula: definition.formula.to_string(),
                    propositions: &definition.formula.propositions,
                })
                .collect(),
            failures: &outcome.failures,
            stats: &outcome.stats,
            error: outcome.error.as_deref(),
        })
        .collect();

    if !dry_run {
        write_output(output.as_deref(), &to_json(&records, pretty)?)?;
    }

    let failed_batches = outcomes.iter().filter(|outcome| outcome.is_failed()).count();
    let failed_definitions: usize = outcomes.iter().map(|outcome| outcome.stats.failed_count).sum();
    let converted: usize = outcomes.iter().map(|outcome| outcome.stats.converted_count).sum();
    info!(
        batches = outcomes.len(),
        converted, failed_definitions, failed_batches, "Translation finished"
    );

    if failed_batches > 0 || failed_definitions > 0 {
        for outcome in &outcomes {
            if let Some(message) = &outcome.error {
                error!("Batch error: {}", message);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Translate a property file into Büchi automata
async fn translate_to_nba(
    config: TranslatorConfig,
    model: PathBuf,
    property: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = OwlEngine::from_config(&config)?;
    info!("Using Owl at: {:?}", engine.owl_path());

    let dry_run = config.output.dry_run;
    let translator = RebecaTranslator::with_config(config);
    let report = translator
        .translate_to_automata(&BatchSource::new(model, property), &engine)
        .await;

    if let Some(message) = &report.batch.error {
        error!("Batch error: {}", message);
        std::process::exit(1);
    }

    if !dry_run {
        let mut hoa = String::new();
        for named in &report.automata {
            hoa.push_str(&format!("// Automaton for {}: {}\n", named.name, named.automaton.formula));
            hoa.push_str(named.automaton.hoa.trim_end());
            hoa.push('\n');
        }
        write_output(output.as_deref(), hoa.trim_end())?;
    }

    println!("Automata: {}", report.automata.len());
    println!("Skipped definitions: {}", report.batch.failures.len());
    println!("Engine failures: {}", report.engine_failures.len());

    if !report.batch.failures.is_empty() || !report.engine_failures.is_empty() {
        for failure in report.batch.failures.iter().chain(&report.engine_failures) {
            error!("{}: {}", failure.name, failure.message);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Show translator information
fn show_info(config: &TranslatorConfig) {
    println!("Rebeca LTL Translator Information");
    println!("Version: 0.1.0");
    println!("Description: Translates Rebeca property definitions into labelled LTL formulas");
    println!();

    println!("Binary operators:");
    println!("  {}", BinaryOperator::symbols().collect::<Vec<_>>().join(" "));
    println!("Unary operators:");
    println!("  {}", UnaryOperator::symbols().collect::<Vec<_>>().join(" "));
    println!("Temporal calls:");
    println!("  G(p) F(p) X(p)");
    println!();

    println!("Configuration:");
    println!(
        "  Owl path: {}",
        config
            .get_owl_path()
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|_| "not found".to_string())
    );
    println!("  Translation: {}", config.engine.translation);
    println!("  Engine timeout: {}ms", config.engine.timeout_ms);
    println!("  Max expression depth: {}", config.batch.max_expression_depth);
    println!("  Include LTL definitions: {}", config.batch.include_ltl_definitions);
    println!("  Parallel batches: {}", config.batch.max_parallel_batches);
    println!();

    println!("Usage:");
    println!("  rebeca-ltl translate -m <model> -p <property>... [-o <file>]  - Translate to LTL");
    println!("  rebeca-ltl nba -m <model> -p <property> [options]             - Translate to NBA");
    println!("  rebeca-ltl info                                                - Show translator information");
}
