//! `facto verify` — offline evidence-bundle verification. Exits 0 iff
//! the bundle's aggregate `is_valid` is true,
//! 1 otherwise — scripts and CI can gate on the exit code alone; `--json`
//! additionally gives them the structured report to inspect.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use facto_verify::{verify_evidence_bundle, EvidenceBundle, VerificationReport, VerifyOptions};
use std::path::PathBuf;

/// Arguments for the `verify` subcommand.
#[derive(Args)]
pub struct VerifyArgs {
    /// Path to the evidence bundle JSON file to verify.
    bundle: PathBuf,

    /// Additionally fail if any event lacks a Merkle inclusion proof —
    /// defends against silent tail truncation.
    #[arg(long)]
    strict: bool,

    /// Print the report as JSON instead of a colored table.
    #[arg(long)]
    json: bool,
}

/// Run the `verify` subcommand. Returning `Ok(())` here just means the
/// CLI ran without a usage error — `is_valid` drives the process exit
/// code via [`std::process::exit`], independent of this `Result`.
pub fn run(args: VerifyArgs) -> Result<()> {
    let bundle = EvidenceBundle::from_path(&args.bundle)
        .with_context(|| format!("failed to load evidence bundle: {}", args.bundle.display()))?;

    let report = verify_evidence_bundle(&bundle, VerifyOptions { strict: args.strict });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&args.bundle, &report, args.strict);
    }

    std::process::exit(if report.is_valid { 0 } else { 1 });
}

fn print_report(bundle_path: &PathBuf, report: &VerificationReport, strict: bool) {
    println!("{}", "Facto Evidence Bundle Verification".bold().cyan());
    println!("{}", "═".repeat(40).cyan());
    println!();
    println!("  {} {}", "Bundle:".dimmed(), bundle_path.display());
    println!("  {} {}", "Events:".dimmed(), report.events.len());
    println!("  {} {}", "Sessions:".dimmed(), report.chains.len());
    println!();

    println!("{}", "Hashes".bold());
    println!("  valid:   {}", report.hashes_valid().to_string().green());
    println!(
        "  invalid: {}",
        color_count(report.hashes_invalid())
    );
    println!();

    println!("{}", "Signatures".bold());
    println!("  valid:   {}", report.signatures_valid().to_string().green());
    println!("  invalid: {}", color_count(report.signatures_invalid()));
    println!();

    println!("{}", "Chains".bold());
    println!("  valid:   {}", report.chains_valid().to_string().green());
    println!("  invalid: {}", color_count(report.chains_invalid()));
    for chain in &report.chains {
        if !chain.valid {
            let reason = chain.reason.as_deref().unwrap_or("unknown");
            println!("    {} session {}: {}", "✗".red(), chain.session_id, reason);
        }
    }
    println!();

    println!("{}", "Merkle proofs".bold());
    println!(
        "  valid: {} / {}",
        report.merkle_valid().to_string().green(),
        report.merkle_total()
    );
    if strict && !report.missing_merkle_coverage.is_empty() {
        println!(
            "  {} {} event(s) have no Merkle proof (--strict)",
            "✗".red(),
            report.missing_merkle_coverage.len()
        );
    }
    println!();

    if report.is_valid {
        println!("{} bundle is valid", "✓".green().bold());
    } else {
        println!("{} bundle FAILED verification", "✗".red().bold());
    }
}

fn color_count(n: usize) -> colored::ColoredString {
    if n == 0 {
        n.to_string().green()
    } else {
        n.to_string().red().bold()
    }
}
