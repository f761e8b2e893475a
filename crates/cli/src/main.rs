//! benchtrail CLI entry point.

use colored::Colorize;

fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = benchtrail_cli::run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(benchtrail_cli::exit_code(&e));
    }
}
