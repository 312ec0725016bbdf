//! Powerlink node runner
//!
//! Stands in for a workflow runtime: builds the node parameters from flags
//! (or a JSON file), puts the API key into the execution context and runs
//! one invocation, printing the output record.

use anyhow::Result;
use clap::Parser;
use pl_core::config::{get_config, load_environment};
use pl_powerlink::credentials::{API_KEY_PROPERTY, CREDENTIAL_NAME};
use pl_powerlink::description::{self, MAIN_OUTPUT};
use pl_powerlink::request::endpoints;
use pl_powerlink::{ActionDispatcher, PowerlinkNode};
use pl_workflows::{WorkflowContext, WorkflowNode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};

mod params;

use params::{build_parameters, load_params_file, ParamFlags};

#[derive(Parser, Debug)]
#[command(name = "powerlink-node")]
#[command(about = "Run a single Powerlink workflow node invocation")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Execute one action against the Powerlink API
    Run(RunArgs),
    /// Print the node and credential description as JSON
    Describe,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON file with a full parameter set; flags override it
    #[arg(long)]
    params: Option<PathBuf>,

    /// query, addRecord, updateRecord, deleteRecord, addComment, addTask
    #[arg(short, long)]
    action: Option<String>,

    #[arg(long)]
    object_type: Option<i64>,

    #[arg(long)]
    object_id: Option<String>,

    #[arg(long)]
    page_size: Option<i64>,

    #[arg(long)]
    page_number: Option<i64>,

    #[arg(long)]
    sort_by: Option<String>,

    #[arg(long)]
    sort_type: Option<String>,

    /// Comma-separated field list, * for all
    #[arg(long)]
    fields: Option<String>,

    #[arg(long)]
    message: Option<String>,

    #[arg(long)]
    owner_id: Option<String>,

    /// Query parameter as KEY=VALUE (repeatable)
    #[arg(long = "field")]
    field: Vec<String>,

    /// Return only data.Data for queries
    #[arg(long)]
    hide_columns: Option<bool>,
}

impl RunArgs {
    fn flags(&self) -> ParamFlags {
        ParamFlags {
            action: self.action.clone(),
            object_type: self.object_type,
            object_id: self.object_id.clone(),
            page_size: self.page_size,
            page_number: self.page_number,
            sort_by: self.sort_by.clone(),
            sort_type: self.sort_type.clone(),
            fields: self.fields.clone(),
            message: self.message.clone(),
            owner_id: self.owner_id.clone(),
            field: self.field.clone(),
            hide_columns: self.hide_columns,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from /etc/powerlink/environment (if exists)
    load_environment();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("powerlink_node=info".parse()?)
                .add_directive("pl_powerlink=info".parse()?),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Describe => {
            println!("{}", serde_json::to_string_pretty(&description::describe())?);
            Ok(())
        }
        Commands::Run(run) => {
            if let Err(e) = execute(&run).await {
                error!("Powerlink node failed: {:#}", e);
                return Err(e);
            }
            Ok(())
        }
    }
}

async fn execute(run: &RunArgs) -> Result<()> {
    let base = match &run.params {
        Some(path) => load_params_file(path)?,
        None => HashMap::new(),
    };
    let parameters = build_parameters(base, &run.flags())?;

    let base_url = get_config("POWERLINK_BASE_URL", endpoints::BASE_URL);
    let mut credential = Map::new();
    credential.insert(
        API_KEY_PROPERTY.to_string(),
        Value::String(get_config("POWERLINK_API_KEY", "")),
    );

    let ctx = WorkflowContext::new("powerlink-node").with_credentials(CREDENTIAL_NAME, credential);
    info!(execution_id = %ctx.execution_id, base_url = %base_url, "Running Powerlink node");

    let dispatcher = ActionDispatcher::new().with_base_url(base_url);
    let mut node = PowerlinkNode::with_dispatcher("powerlink", dispatcher);
    let result = node.execute(&ctx, parameters).await?;

    for record in result.records(MAIN_OUTPUT) {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    info!(duration_ms = result.duration_ms, "Powerlink node completed");
    Ok(())
}
