//! Operator CLI: run one request, probe or watch the local server,
//! list built-in templates.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};

use promptgate::{
  Gateway, GatewayConfig, GenerationResult, HealthMonitor, HealthProbe,
  TemplateLibrary,
};

#[derive(Parser)]
#[command(name = "promptgate", version, about = "Route one prompt to any LLM backend")]
struct Cli
{   #[command(subcommand)]
    command: Command
}

#[derive(Subcommand)]
enum Command
{   /// Run a generation request read as JSON from a file or stdin
    Generate
    {   #[arg(short, long)]
        file: Option<PathBuf>
    }
  , /// Probe the local inference server once
    Status
  , /// Print every health snapshot until Ctrl-C
    Watch
    {   /// Seconds between probes (overrides config)
        #[arg(short, long)]
        interval: Option<u64>
    }
  , /// List built-in meta-prompt templates
    Templates
    {   #[arg(short, long)]
        category: Option<String>
    }
}

#[tokio::main]
async fn main() -> ExitCode
{   // A missing .env is fine.
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let config = match GatewayConfig::from_env()
    {   Ok(config) => config
      , Err(e) => {
          error!("{}", e);
          eprintln!("{}", e);
          return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await
    {   Ok(code) => code
      , Err(e) => {
          error!("{:#}", e);
          eprintln!("{:#}", e);
          ExitCode::FAILURE
        }
    }
}

async fn run(
  command: Command
, config: GatewayConfig
) -> Result<ExitCode>
{   match command
    {   Command::Generate { file } => {
          let body = match file
          {   Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read request file {:?}", path))?
            , None => {
                let mut body = String::new();
                std::io::stdin()
                  .read_to_string(&mut body)
                  .context("Failed to read request from stdin")?;
                body
              }
          };
          let gateway = Gateway::new(&config)
            .context("Failed to build provider registry")?;
          let result: GenerationResult = gateway.handle_json(&body).await;
          println!("{}", serde_json::to_string_pretty(&result)?);
          Ok(if result.is_error()
          {   ExitCode::FAILURE
          } else
          {   ExitCode::SUCCESS
          })
        }
      , Command::Status => {
          let snapshot = HealthProbe::from_config(&config).check().await;
          println!("{}", serde_json::to_string_pretty(&snapshot)?);
          Ok(if snapshot.is_available()
          {   ExitCode::SUCCESS
          } else
          {   ExitCode::FAILURE
          })
        }
      , Command::Watch { interval } => {
          let interval = interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| config.health.poll_interval());
          info!("Watching {} every {:?}", config.ollama.base_url, interval);

          let monitor = HealthMonitor::start(
            HealthProbe::from_config(&config),
            interval
          );
          let mut updates = monitor.subscribe();
          loop
          { tokio::select!
            { changed = updates.changed() => {
                if changed.is_err()
                {   break;
                }
                let snapshot = updates.borrow_and_update().clone();
                println!("{}", serde_json::to_string(&*snapshot)?);
              }
            , _ = tokio::signal::ctrl_c() => {
                debug!("Ctrl-C received");
                break;
              }
            }
          }
          monitor.shutdown().await;
          Ok(ExitCode::SUCCESS)
        }
      , Command::Templates { category } => {
          let library = TemplateLibrary::new();
          let templates = match category.as_deref()
          {   Some(category) => library.for_category(category)
            , None => library.iter().collect()
          };
          println!("{}", serde_json::to_string_pretty(&templates)?);
          Ok(ExitCode::SUCCESS)
        }
    }
}
