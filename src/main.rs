mod cancel;
mod cli;
mod config;
mod dispatch;
mod error;
mod extractors;
mod locator;
mod matcher;
mod options;
mod walker;

use crate::cancel::CancelToken;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{DocgrepError, Result};
use crate::matcher::MatchedLine;
use crate::options::SearchOptions;
use clap::Parser;
use colored::*;
use env_logger::{Builder, Env, Target};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use walker::{searchable_files, WalkOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let start_time = Instant::now();
    info!("Searching for {:?} under {}", cli.terms, cli.path.display());

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {e}");
        Config::default()
    });

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Cancellation requested");
            cancel.cancel();
        })
        .map_err(|e| DocgrepError::Other(e.to_string()))?;
    }

    let opts = SearchOptions {
        whole_word: cli.whole_word || config.search.whole_word,
        use_regex: cli.regex || config.search.regex,
        multiline: cli.multiline || config.search.multiline,
        match_all_terms: cli.all_terms || config.search.all_terms,
        case_insensitive: !(cli.case_sensitive || config.search.case_sensitive),
        dot_matches_newline: cli.dot_all,
        cancel: cancel.clone(),
    };

    // Surface a malformed pattern once, before any file is opened, instead
    // of once per scanned file.
    matcher::Matcher::new(Path::new(""), &cli.terms, &opts, matcher::WindowStyle::Plain)?;

    let extensions = cli
        .extensions
        .clone()
        .or_else(|| {
            if config.search.default_extensions.is_empty() {
                None
            } else {
                Some(config.search.default_extensions.clone())
            }
        });
    let max_size_mb = cli.max_size.or(config.limits.max_file_size_mb);

    let files = searchable_files(
        &cli.path,
        &WalkOptions {
            recursive: cli.recursive,
            show_hidden: cli.hidden,
            extensions: extensions.as_deref(),
            max_size_mb,
        },
    );
    info!("Scanning {} files", files.len());

    let results = Mutex::new(Vec::new());
    let processing_errors = Mutex::new(Vec::<DocgrepError>::new());

    files.par_iter().enumerate().for_each(|(index, path)| {
        if opts.cancel.is_cancelled() {
            return;
        }
        match dispatch::search(path, &cli.terms, &opts) {
            Ok(records) => {
                if !records.is_empty() {
                    results.lock().unwrap().push((index, records));
                }
            }
            Err(e) => {
                processing_errors.lock().unwrap().push(e);
            }
        }
    });

    if cancel.is_cancelled() {
        println!("{}", "Search cancelled".yellow());
        return Ok(());
    }

    // Restore walk order; parallel completion order is arbitrary.
    let mut results = results.into_inner().unwrap();
    results.sort_by_key(|(index, _)| *index);

    let total: usize = results.iter().map(|(_, records)| records.len()).sum();
    if total == 0 {
        println!("{}", "No matches found".yellow());
    } else {
        for (_, records) in &results {
            for record in records {
                if !record.file_name.is_empty() {
                    println!("\n{}", record.file_name.green().bold());
                }
                println!("{}", render_match(record));
            }
        }
        println!("\n{} {} {}", "Found".green(), total, "matches".green());
    }

    let collected_errors = processing_errors.into_inner().unwrap();
    if !collected_errors.is_empty() {
        eprintln!("\n{}", "Errors encountered during processing:".red().bold());
        for err in collected_errors {
            eprintln!("{}", err.to_string().red());
        }
    }

    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.exists() {
                fs::create_dir_all(parent_dir).map_err(DocgrepError::Io)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(DocgrepError::Io)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| DocgrepError::Other(e.to_string()))?;
    Ok(())
}

/// Renders one record with the matched span highlighted, using the stored
/// character offsets.
fn render_match(record: &MatchedLine) -> String {
    let chars: Vec<char> = record.content.chars().collect();
    let end = record.start_index + record.length;
    let before: String = chars[..record.start_index].iter().collect();
    let hit: String = chars[record.start_index..end].iter().collect();
    let after: String = chars[end..].iter().collect();
    format!("{before}{}{after}", hit.red().bold())
}
