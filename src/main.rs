use std::{path::PathBuf, sync::Arc};

use analysis_purge::{
    config::EngineConfig,
    db::DbPool,
    models::{DeletedEntity, Qualifier},
    observability::{self, metrics},
    purge::{LoggingPurgeListener, PurgeConfiguration, PurgeOutcome, PurgeResult},
    services::PurgeService,
};
use clap::Parser;

/// Config file looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "analysis-purge.toml";

/// CLI arguments for the purge engine
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Retention and cascading deletion of analysis history",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (defaults to ./analysis-purge.toml if it exists,
    /// otherwise built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run database migrations and exit
    Migrate,
    /// Apply retention to one branch or portfolio
    Purge {
        /// Branch or portfolio being purged
        #[arg(long)]
        root: String,
        /// Project the root belongs to (defaults to the root itself)
        #[arg(long)]
        project: Option<String>,
        /// Components the last analysis no longer reports
        #[arg(long = "disabled", value_delimiter = ',')]
        disabled: Vec<String>,
    },
    /// Delete a project, application or portfolio with all its branches
    DeleteProject {
        #[arg(long)]
        uuid: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        name: String,
        /// TRK, APP or VW
        #[arg(long, default_value = "TRK")]
        qualifier: Qualifier,
    },
    /// Delete a single branch or pull request
    DeleteBranch {
        #[arg(long)]
        uuid: String,
    },
    /// Delete analyses by uuid
    DeleteAnalyses {
        #[arg(required = true)]
        uuids: Vec<String>,
    },
    /// List the analyses of a branch retention may consider
    Analyses {
        #[arg(long)]
        branch: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = load_config(args.config.as_deref());
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    if config.database.is_none() {
        eprintln!("Error: Database is not configured.");
        std::process::exit(1);
    }

    let db = match DbPool::from_config(&config.database).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let service = PurgeService::new(db.clone()).with_listener(Arc::new(LoggingPurgeListener));

    let code = match args.command {
        Command::Migrate => match db.run_migrations().await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: Database migrations failed: {}", e);
                1
            }
        },
        Command::Purge {
            root,
            project,
            disabled,
        } => {
            let project = project.unwrap_or_else(|| root.clone());
            let purge_config =
                PurgeConfiguration::from_settings(root, project, disabled, &config.retention);
            print_outcome(service.purge(&purge_config).await)
        }
        Command::DeleteProject {
            uuid,
            key,
            name,
            qualifier,
        } => {
            let entity = DeletedEntity {
                uuid,
                key,
                name,
                qualifier,
            };
            print_outcome(service.delete_project(&entity).await)
        }
        Command::DeleteBranch { uuid } => print_outcome(service.delete_branch(&uuid).await),
        Command::DeleteAnalyses { uuids } => print_outcome(service.delete_analyses(&uuids).await),
        Command::Analyses { branch } => match service.select_purgeable_analyses(&branch).await {
            Ok(analyses) => print_json(&analyses),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    };

    if let Err(e) = metrics::flush_textfile(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to write metrics textfile");
    }
    std::process::exit(code);
}

/// Load the explicit config, the default file, or built-in defaults.
fn load_config(explicit: Option<&str>) -> EngineConfig {
    let path = match explicit {
        Some(path) => PathBuf::from(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return EngineConfig::default();
            }
            default
        }
    };

    match EngineConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn print_outcome(result: PurgeResult<PurgeOutcome>) -> i32 {
    match result {
        Ok(outcome) => print_json(&outcome.report),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: Failed to serialize output: {}", e);
            1
        }
    }
}
