use colored::*;

use crate::commands::{AggregateSummary, CliError};

pub fn print_aggregate_summary(summary: &AggregateSummary) {
    let report = &summary.report;
    println!(
        "{} {} records",
        "✔ Ruleset aggregated:".green().bold(),
        report.final_records.to_string().bold()
    );
    for count in &report.layers {
        println!("  {} rules: {}", count.layer, count.rules);
    }
    println!(
        "  Merged keys: {} ({} overridden)",
        report.merged_rules, report.overridden_keys
    );
    println!(
        "  Deleted: {} keys, {} domains",
        report.deleted_keys, report.deleted_domains
    );
    println!(
        "  Groups expanded: {} ({} domain collisions)",
        report.expanded_groups, report.domain_collisions
    );
    if let Some(version) = &summary.version {
        println!("  Version: {}", version);
    }
    for marker in &report.unmatched_markers {
        print_warning(&format!("group deletion marker {} matched no group", marker));
    }
    for path in &summary.written {
        println!("  Wrote {}", path.display());
    }
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "!".yellow().bold(), message);
}

pub fn print_error(err: &CliError) {
    eprintln!("{} {}", "✘ Aggregation failed:".red().bold(), err);
}
