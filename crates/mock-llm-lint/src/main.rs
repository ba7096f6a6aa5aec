//! mock-llm Configuration Linter CLI
//!
//! Usage:
//!   mock-llm-lint <file_or_directory> [OPTIONS]

use clap::Parser;
use mock_llm_lint::{collect_config_files, lint_file, LintIssue, LintOptions, LintResult, Severity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser, Debug)]
#[command(name = "mock-llm-lint")]
#[command(author, version, about = "Validate mock-llm rule configuration files")]
struct Args {
    /// Configuration file, or directory of .yaml/.yml/.json files
    #[arg(required = true)]
    path: PathBuf,

    /// Output format: text (default), json
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Only show errors (hide warnings and notes)
    #[arg(short = 'e', long)]
    errors_only: bool,

    /// Strict mode - treat warnings as errors
    #[arg(short, long)]
    strict: bool,

    /// Skip the check that templates render to JSON
    #[arg(long)]
    no_template_json: bool,

    /// Skip notes about rules hidden by later catch-all rules
    #[arg(long)]
    no_shadowing: bool,
}

fn main() {
    let args = Args::parse();
    let options = LintOptions {
        check_template_json: !args.no_template_json,
        report_shadowing: !args.no_shadowing,
    };

    let files = collect_config_files(&args.path);
    if files.is_empty() {
        eprintln!(
            "{YELLOW}Warning:{RESET} No configuration files found in {}",
            args.path.display()
        );
        std::process::exit(0);
    }

    let mut result = LintResult::new();
    for file in &files {
        result.merge(lint_file(file, &options));
    }

    if args.output == "json" {
        print_results_json(&result);
    } else {
        println!("{BOLD}{CYAN}mock-llm Configuration Linter{RESET}");
        println!("{DIM}{RULE}{RESET}");
        println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}", args.path.display());
        println!("{DIM}Found:{RESET}    {BOLD}{}{RESET} file(s)", files.len());
        print_results(&result, args.errors_only);
    }

    std::process::exit(if result.fails(args.strict) { 1 } else { 0 });
}

fn print_results_json(result: &LintResult) {
    match serde_json::to_string_pretty(result) {
        Ok(output) => println!("{output}"),
        Err(e) => eprintln!("{RED}Failed to serialize results: {e}{RESET}"),
    }
}

fn print_results(result: &LintResult, errors_only: bool) {
    println!();

    let mut issues_by_file: BTreeMap<&Path, Vec<&LintIssue>> = BTreeMap::new();
    for issue in &result.issues {
        if errors_only && issue.severity != Severity::Error {
            continue;
        }
        issues_by_file.entry(issue.file.as_path()).or_default().push(issue);
    }

    if issues_by_file.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    }

    for (file, issues) in &issues_by_file {
        let file_errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let file_warnings = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();

        let status_indicator = if file_errors > 0 {
            format!("{RED}FAIL{RESET}")
        } else if file_warnings > 0 {
            format!("{YELLOW}WARN{RESET}")
        } else {
            format!("{CYAN}NOTE{RESET}")
        };

        let file_name = file.file_name().unwrap_or_default().to_string_lossy();
        println!(
            "{status_indicator} {BOLD}{CYAN}{file_name}{RESET} {DIM}({file_errors} error(s), {file_warnings} warning(s)){RESET}"
        );

        let mut sorted = issues.clone();
        sorted.sort_by_key(|i| i.severity);
        for issue in sorted {
            print_issue(issue);
        }
        println!();
    }

    println!("{DIM}{RULE}{RESET}");
    println!("{BOLD}{CYAN}Summary{RESET}");
    println!("{DIM}{RULE}{RESET}");
    println!(
        "  {DIM}Files checked:{RESET} {BOLD}{}{RESET}",
        result.files_checked
    );
    let error_color = if result.errors > 0 { RED } else { GREEN };
    println!(
        "  {error_color}Errors:{RESET}    {BOLD}{error_color}{}{RESET}",
        result.errors
    );
    let warning_color = if result.warnings > 0 { YELLOW } else { DIM };
    println!(
        "  {warning_color}Warnings:{RESET}  {BOLD}{}{RESET}",
        result.warnings
    );
    println!("  {DIM}Notes:{RESET}     {BOLD}{}{RESET}", result.infos);
    println!();

    if result.errors == 0 && result.warnings == 0 {
        println!("{GREEN}{BOLD}All checks passed!{RESET}");
    } else if result.errors == 0 {
        println!("{YELLOW}{BOLD}Passed with warnings{RESET}");
    } else {
        println!("{RED}{BOLD}Linting failed with errors{RESET}");
    }
}

fn print_issue(issue: &LintIssue) {
    let color = severity_color(issue.severity);
    let marker = format!("{color}|{RESET}");
    let location = issue
        .location
        .as_ref()
        .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET} "))
        .unwrap_or_default();

    println!(
        "  {marker} {location}{BOLD}{color}{}{RESET}: {} {DIM}({color}{}{DIM}){RESET}",
        issue.severity, issue.message, issue.code
    );
    if let Some(suggestion) = &issue.suggestion {
        println!("  {marker}   {GREEN}-> {suggestion}{RESET}");
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    }
}
