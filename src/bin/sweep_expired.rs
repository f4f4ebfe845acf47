//! CLI tool to persist `expired` on documents whose expiry date has passed.
//!
//! Usage:
//!   cargo run --bin sweep-expired
//!   cargo run --bin sweep-expired -- --as-of 2026-01-31

use std::env;

use chrono::NaiveDate;

use student_docs_lib::config::Config;
use student_docs_lib::db::DbPool;
use student_docs_lib::services::expiry;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "help" || a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let today = match parse_as_of(&args) {
        Ok(Some(date)) => date,
        Ok(None) => expiry::today(),
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::connect(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match expiry::mark_expired_documents(&pool, today).await {
        Ok(count) => println!("Marked {} document(s) expired as of {}", count, today),
        Err(e) => {
            eprintln!("Error sweeping expired documents: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_as_of(args: &[String]) -> Result<Option<NaiveDate>, String> {
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--as-of" {
            let value = args
                .get(i + 1)
                .ok_or_else(|| "--as-of requires a date".to_string())?;
            return NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| format!("invalid --as-of date '{}': {}", value, e));
        }
        i += 1;
    }
    Ok(None)
}

fn print_usage() {
    eprintln!("Usage: sweep-expired [--as-of YYYY-MM-DD]");
    eprintln!();
    eprintln!("Sets status 'expired' on every document whose expiry date is before");
    eprintln!("the given date (default: today, UTC).");
}
