//! restage — clone a production database into staging.
//!
//! ```text
//! restage orders-prod --slack
//! ```
//!
//! Restores the latest automated snapshot of the named production
//! cluster into a date-stamped staging cluster, creates an instance,
//! and repoints the dependent services at the new endpoint. Config
//! comes from `restage.toml` (override with `RESTAGE_CONFIG`).
//!
//! Exit codes: 0 on success and on graceful early exits (inconsistent
//! cluster inventory, no snapshots); 1 on unknown databases, malformed
//! arguments, and control-plane failures.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use restage_aws::{EcsControlPlane, RdsControlPlane};
use restage_core::{Notifier, RestageConfig};
use restage_slack::SlackNotifier;
use restage_workflow::{Workflow, WorkflowOptions};

#[derive(Parser)]
#[command(
    name = "restage",
    about = "Clone a production database into staging and repoint its services",
    version,
)]
struct Cli {
    /// Logical name of the production database to clone.
    database: Option<String>,

    /// Mirror progress to Slack (reads SLACK_TOKEN and SLACK_CHANNEL).
    #[arg(long)]
    slack: bool,
}

/// Progress sink: always echoes to stdout, optionally mirrors to
/// Slack. The operator watching the terminal and the channel watching
/// the rollout see the same text.
struct ConsoleSink {
    slack: Option<SlackNotifier>,
}

impl ConsoleSink {
    fn new(use_slack: bool) -> Self {
        let slack = if use_slack {
            let notifier = SlackNotifier::from_env();
            if notifier.is_none() {
                warn!("--slack given but SLACK_TOKEN/SLACK_CHANNEL are unset, console only");
            }
            notifier
        } else {
            None
        };
        Self { slack }
    }
}

impl Notifier for ConsoleSink {
    async fn notify(&self, text: &str) {
        println!("{text}");
        if let Some(slack) = &self.slack {
            slack.notify(text).await;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,restage=debug".parse().unwrap()),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    let config_path =
        std::env::var("RESTAGE_CONFIG").unwrap_or_else(|_| "restage.toml".to_string());
    let config = match RestageConfig::from_file(Path::new(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %config_path, error = %err, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let sink = ConsoleSink::new(cli.slack);

    let Some(database) = cli.database else {
        sink.notify(&format!(
            "Name of database is required (the production database to clone into staging); \
             supported databases: {:?}",
            config.database_names()
        ))
        .await;
        return ExitCode::FAILURE;
    };

    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let rds = RdsControlPlane::new(&aws);
    let ecs = EcsControlPlane::new(&aws);

    let options = WorkflowOptions::from_settings(&config.workflow);
    let workflow = Workflow::new(&config, &rds, &ecs, &sink, options);

    match workflow.run(&database).await {
        Ok(report) => {
            info!(
                cluster = %report.cluster_id,
                endpoint = %report.endpoint,
                "clone complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            sink.notify(&err.to_string()).await;
            if err.is_soft_stop() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
