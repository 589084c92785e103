use acl_oracles_core::scenario::{QueryOutcome, Scenario};
use anyhow::{Context, Result};

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::exit_codes;

pub fn run(args: CheckArgs) -> Result<i32> {
    let scenario = Scenario::from_file(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    let outcomes = scenario
        .evaluate()
        .with_context(|| format!("failed to evaluate scenario {}", args.scenario.display()))?;

    match args.format {
        OutputFormat::Text => {
            for outcome in &outcomes {
                println!("{}", render_text(outcome));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcomes)
                .context("failed to serialize outcomes")?;
            println!("{json}");
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_error()).count();
    tracing::info!(
        event = "check_complete",
        queries = outcomes.len(),
        failed,
        scenario = %args.scenario.display()
    );

    if failed > 0 {
        Ok(exit_codes::QUERY_FAILED)
    } else {
        Ok(exit_codes::OK)
    }
}

fn render_text(outcome: &QueryOutcome) -> String {
    match (outcome.allowed, outcome.reason_code) {
        (Some(true), _) => format!("{}: allow", outcome.name),
        (Some(false), _) => format!("{}: deny", outcome.name),
        (None, code) => format!(
            "{}: error {} ({})",
            outcome.name,
            code.unwrap_or("UNKNOWN"),
            outcome.error.as_deref().unwrap_or_default()
        ),
    }
}
