//! lazypipe CLI: run, validate and explain YAML pipelines.

use clap::{Parser, Subcommand};
use lazypipe_core::config::{ConfigOverrides, EngineConfig};
use lazypipe_core::producer::{BoxProducer, VecProducer};
use lazypipe_core::{Item, Value};
use lazypipe_exec::Pipeline;
use lazypipe_operators::registry;
use lazypipe_planner::{plan_yaml, PhysicalProgram};
use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lazypipe")]
#[command(about = "lazypipe: lazy key/value pipelines with runtime control flow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// JSON-lines input replacing the pipeline's source ("-" for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Consume through the pull path instead of the push-driven engine
        #[arg(long)]
        pull: bool,

        /// Cap on item deliveries (overrides config)
        #[arg(long)]
        max_steps: Option<u64>,

        /// Trace every delivered item
        #[arg(long)]
        trace_items: bool,

        /// Log a metrics summary at the end of the run
        #[arg(long)]
        metrics: bool,
    },

    /// Validate a pipeline YAML file (parse and lower)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the stages, their plans and the plan hash (EXPLAIN)
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            pipeline,
            input,
            pull,
            max_steps,
            trace_items,
            metrics,
        } => {
            let overrides = ConfigOverrides {
                max_steps,
                trace_items: trace_items.then_some(true),
                emit_metrics: metrics.then_some(true),
            };
            run_pipeline(&pipeline, input.as_deref(), pull, &overrides)
        }
        Commands::Validate { pipeline } => validate_pipeline(&pipeline).map(|steps| {
            println!("✓ Pipeline is valid ({steps} stages)");
        }),
        Commands::Explain { pipeline } => explain_pipeline(&pipeline),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(pipeline_path: &Path) -> CliResult<PhysicalProgram> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    Ok(plan_yaml(&yaml_content)?)
}

/// Defaults < environment < pipeline `config:` < command line.
fn resolve_config(program: &PhysicalProgram, cli: &ConfigOverrides) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    config.overlay(&program.config);
    config.overlay(cli);
    config
}

fn run_pipeline(
    pipeline_path: &Path,
    input: Option<&Path>,
    pull: bool,
    overrides: &ConfigOverrides,
) -> CliResult<()> {
    let program = load(pipeline_path)?;
    let source = input.map(read_input).transpose()?;
    let config = resolve_config(&program, overrides);
    tracing::debug!(?config, stages = program.bindings.len(), "resolved engine config");
    let pipeline = Pipeline::from_program(&program, source, EngineConfig::default())?
        .with_config(config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if pull {
        for item in pipeline.stream() {
            writeln!(out, "{}", serde_json::to_string(&item?)?)?;
        }
        out.flush()?;
        return Ok(());
    }

    let output = pipeline.run()?;
    for item in &output.items {
        writeln!(out, "{}", serde_json::to_string(item)?)?;
    }
    out.flush()?;

    let manifest = &output.manifest;
    eprintln!("✓ Pipeline executed successfully");
    eprintln!("  Run id: {}", manifest.id);
    eprintln!("  Duration: {}ms", manifest.elapsed_ms());
    eprintln!("  Plan hash: {}", manifest.plan_hash.short(16));
    eprintln!("  Items out: {}", manifest.items_out);
    if let Some(digest) = &manifest.outputs_digest {
        eprintln!("  Output digest: {}", digest.short(16));
    }
    eprintln!("  Engine: {}", manifest.engine_version);
    eprintln!("  Metrics: {}", serde_json::to_string(&output.metrics)?);
    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> CliResult<usize> {
    Ok(load(pipeline_path)?.bindings.len())
}

fn explain_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let program = load(pipeline_path)?;

    println!("Pipeline Execution Plan");
    println!("======================");
    println!();
    match &program.source {
        Some(source) => println!("Source: {}", serde_json::to_string(source)?),
        None => println!("Source: (none; supply --input)"),
    }
    println!("Plan hash: {}", program.plan_hash()?);
    println!();
    println!("Stages:");
    for (i, binding) in program.bindings.iter().enumerate() {
        let plan = registry::build(&binding.key, &binding.config)?.plan();
        println!(
            "  {}. {} {} {}",
            i + 1,
            binding.key,
            serde_json::to_string(&binding.config)?,
            serde_json::to_string(&plan)?
        );
    }
    if !program.rewrites.is_empty() {
        println!();
        println!("Rewrites:");
        for note in &program.rewrites {
            println!("  - {}", note);
        }
    }
    Ok(())
}

/// One item per line: `{"key": .., "value": ..}` or a bare value keyed by line index.
fn read_input(path: &Path) -> CliResult<BoxProducer> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(io::BufReader::new(io::stdin()))
    } else {
        Box::new(io::BufReader::new(fs::File::open(path)?))
    };
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(&line)?;
        items.push(parse_item(items.len(), json));
    }
    Ok(Box::new(VecProducer::new(items)))
}

fn parse_item(index: usize, json: serde_json::Value) -> Item {
    match json {
        serde_json::Value::Object(mut map)
            if map.len() == 2 && map.contains_key("key") && map.contains_key("value") =>
        {
            let key = map.remove("key").unwrap_or_default();
            let value = map.remove("value").unwrap_or_default();
            Item::new(Value::from(key), Value::from(value))
        }
        other => Item::new(index, Value::from(other)),
    }
}
