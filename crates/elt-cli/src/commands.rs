use anyhow::{Context, Result};
use tracing::info;

use elt_cli::document::TableDocument;
use elt_cli::pipeline::{
    CheckOptions, CheckReport, MatchOutcome, check, match_rule, normalize, parse_combination,
};

use crate::cli::{CheckArgs, MatchArgs, NormalizeArgs};
use crate::summary::{print_check_report, print_match};

/// Runs `elt check`; returns true when error-severity issues were found.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let document = TableDocument::load(&args.document)?;
    let report: CheckReport = check(
        &document,
        CheckOptions {
            materialize: !args.no_materialize,
        },
    )?;
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "check finished"
    );
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        print_check_report(&report);
    }
    Ok(report.has_errors())
}

/// Runs `elt match`; returns true when a rule matched.
pub fn run_match(args: &MatchArgs) -> Result<bool> {
    let document = TableDocument::load(&args.document)?;
    let combination = parse_combination(&args.attributes, &document.header_types)?;
    let outcome: Option<MatchOutcome> = match_rule(&document, &combination)?;
    match (&outcome, args.json) {
        (Some(outcome), true) => println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("serialize match")?
        ),
        (Some(outcome), false) => print_match(outcome),
        (None, true) => println!("null"),
        (None, false) => println!("No rule matches the given attributes."),
    }
    Ok(outcome.is_some())
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let document = TableDocument::load(&args.document)?;
    let normalized = normalize(&document)?;
    match &args.output {
        Some(path) => {
            normalized.save(path)?;
            info!(path = %path.display(), "wrote normalized document");
        }
        None => println!("{}", normalized.to_json()?),
    }
    Ok(())
}
