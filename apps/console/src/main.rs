use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    catalog::Catalog,
    dispatch::{DispatchController, DispatchOutcome},
    error::SubmitError,
    report_view::ReportView,
    submission::{SubmissionController, WorkflowUpdate},
    transport::HttpRiskService,
};
use shared::{domain::Field, error::ErrorCategory};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing_subscriber::EnvFilter;

mod config;

const SUGGESTION_LIMIT: usize = 5;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "climate.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze risk for a location and print the report.
    Report {
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "")]
        profession: String,
        #[arg(long, default_value = "")]
        concern: String,
        /// Send the official dispatch when the report offers one.
        #[arg(long)]
        dispatch: bool,
    },
    /// List catalog options for a field.
    Options {
        #[arg(long, default_value = "city")]
        field: String,
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Report {
            city,
            profession,
            concern,
            dispatch,
        } => run_report(&cli.config, &city, &profession, &concern, dispatch).await,
        Command::Options {
            field,
            filter,
            limit,
        } => {
            let field = Field::parse(&field)
                .ok_or_else(|| anyhow!("unknown field '{field}'; use city, profession or concern"))?;
            for entry in Catalog::for_field(field).suggest(&filter, limit) {
                println!("{entry}");
            }
            Ok(())
        }
    }
}

async fn run_report(
    config_path: &std::path::Path,
    city: &str,
    profession: &str,
    concern: &str,
    send_dispatch: bool,
) -> Result<()> {
    let settings = config::load_settings(config_path)?;
    let service = Arc::new(HttpRiskService::new(settings.api_base()?));
    let controller = SubmissionController::new(service.clone(), settings.timing.clone());

    controller.edit(Field::City, city);
    controller.edit(Field::Profession, profession);
    controller.edit(Field::Concern, concern);

    if let Some(message) = controller.snapshot().form.error(Field::City) {
        eprintln!("city: {message}");
        let hints = Catalog::for_field(Field::City).suggest(city, SUGGESTION_LIMIT);
        if !hints.is_empty() {
            eprintln!("did you mean: {}", hints.join(", "));
        }
        bail!("submission blocked by validation");
    }

    let renderer = tokio::spawn(render_progress(controller.subscribe()));
    let outcome = controller.submit().await;
    // closes the update channel so the renderer drains and exits
    drop(controller);
    let _ = renderer.await;

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{}", user_notice(&err));
            return Err(err.into());
        }
    };

    let view = ReportView::build(&report);
    let dispatcher = DispatchController::new(service, settings.recipient_email.clone());
    println!("{}", view.render(dispatcher.state()));

    if send_dispatch && view.dispatch_terminal.is_none() {
        println!("This report offers no official dispatch.");
    } else if send_dispatch {
        match dispatcher.dispatch(&report).await {
            DispatchOutcome::Sent | DispatchOutcome::Failed(_) => {
                println!("{}", view.render(dispatcher.state()));
            }
            DispatchOutcome::Unavailable => {
                println!("This report offers no official dispatch.");
            }
            DispatchOutcome::Skipped(state) => {
                println!("Dispatch button is disabled ({state:?}).");
            }
        }
    }

    Ok(())
}

async fn render_progress(updates: broadcast::Receiver<WorkflowUpdate>) {
    let mut stream = BroadcastStream::new(updates);
    while let Some(update) = stream.next().await {
        match update {
            Ok(WorkflowUpdate::Caption(caption)) => eprintln!("{caption}"),
            Ok(WorkflowUpdate::Progress(progress)) => eprintln!("AGENT ANALYSIS: {progress}%"),
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "progress renderer lagged"),
        }
    }
}

fn user_notice(err: &SubmitError) -> String {
    match err.category() {
        ErrorCategory::Network => {
            format!("Could not reach the analysis service. Check the connection and try again. ({err})")
        }
        ErrorCategory::Protocol => {
            format!("The analysis service returned an unexpected response. ({err})")
        }
        ErrorCategory::Validation | ErrorCategory::Dispatch => err.to_string(),
    }
}
