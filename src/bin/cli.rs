use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eo_stageout::handler::ExecutionOutcome;
use eo_stageout::prelude::*;
use eo_stageout::runner::{Outputs, RunnerError};

#[derive(Parser)]
#[command(name = "eo-stageout")]
#[command(about = "Run stage-out execution hooks around a workflow result", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pre/post hooks around a recorded engine outcome
    Run {
        /// Host configuration file (YAML)
        #[arg(long, value_name = "FILE")]
        conf: PathBuf,

        /// Declared inputs (JSON, name -> {"value": ...})
        #[arg(long, value_name = "FILE")]
        inputs: Option<PathBuf>,

        /// Engine outcome to replay (JSON)
        #[arg(long, value_name = "FILE")]
        outcome: PathBuf,

        /// CWL application package
        #[arg(long, value_name = "FILE", default_value = "app-package.cwl")]
        cwl: PathBuf,

        /// Name of the output slot to fill
        #[arg(long, default_value = "stac")]
        output: String,
    },

    /// Consolidate an output catalog and print the collection
    Consolidate {
        /// Catalog location (s3://bucket/key or bucket/key)
        #[arg(value_name = "CATALOG")]
        catalog: String,

        /// Collection id to assign
        #[arg(long)]
        collection_id: String,
    },

    /// Validate a host configuration file without running anything
    Validate {
        /// Host configuration file (YAML)
        #[arg(value_name = "FILE")]
        conf: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "eo_stageout=debug"
    } else {
        "eo_stageout=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

/// Hands a recorded outcome back to the runner in place of a live engine
struct ReplayExecutor {
    outcome: ExecutionOutcome,
}

#[async_trait]
impl WorkflowExecutor for ReplayExecutor {
    async fn execute(
        &self,
        _cwl: &serde_yaml::Value,
        _config: &ExecutionConfig,
        _inputs: &Inputs,
        _working_dir: &std::path::Path,
        _handler: &dyn ExecutionHandler,
    ) -> Result<ExecutionOutcome, RunnerError> {
        Ok(self.outcome.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "eo-stageout failed");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run {
            conf,
            inputs,
            outcome,
            cwl,
            output,
        } => run_hooks(conf, inputs, outcome, cwl, output).await,
        Commands::Consolidate {
            catalog,
            collection_id,
        } => run_consolidate(catalog, collection_id).await,
        Commands::Validate { conf } => validate(conf),
    }
}

async fn run_hooks(
    conf: PathBuf,
    inputs: Option<PathBuf>,
    outcome: PathBuf,
    cwl: PathBuf,
    output: String,
) -> anyhow::Result<bool> {
    let config = ExecutionConfig::from_yaml_file(&conf)?;

    let inputs: Inputs = match inputs {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Inputs::default(),
    };

    let outcome: ExecutionOutcome = serde_json::from_str(&std::fs::read_to_string(outcome)?)?;

    let workspace: Option<Arc<dyn WorkspaceApi>> = if config.platform.workspace_configured() {
        Some(Arc::new(WorkspaceClient::new(
            &config.platform.workspace_url,
            &config.auth.jwt,
        )))
    } else {
        None
    };
    let cluster = KubeConfigMaps::from_cluster_env()
        .ok()
        .map(|c| Arc::new(c) as Arc<dyn ConfigMapSource>);

    let mut handler = StageHandler::new(config, &inputs, workspace, cluster);
    let mut outputs = Outputs::from_names(&[output.as_str()]);

    let runner = Runner::from_cwl_file(&cwl, Arc::new(ReplayExecutor { outcome }))?;
    let status = runner.execute(&mut handler, &inputs, &mut outputs).await;

    if let Some(collection) = outputs.get(&output) {
        println!("{}", collection);
    }

    Ok(status.is_success())
}

async fn run_consolidate(catalog: String, collection_id: String) -> anyhow::Result<bool> {
    let stage = StageConfig::from_env();
    let io = S3StorageIo::new(stage.stage_out.clone(), stage.access_point.clone());

    let consolidated = consolidate(&io, &catalog, &collection_id, &stage.stage_out).await;
    println!("{}", consolidated.to_json_string());

    Ok(!consolidated.is_empty())
}

fn validate(conf: PathBuf) -> anyhow::Result<bool> {
    if !conf.exists() {
        anyhow::bail!("Configuration file not found: {}", conf.display());
    }

    let config = ExecutionConfig::from_yaml_file(&conf)?;
    println!("✓ {} is valid", conf.display());
    if config.platform.workspace_configured() {
        println!("  workspace: {}", config.platform.workspace_url);
    } else {
        println!("  workspace: not configured (static storage details)");
    }
    Ok(true)
}
