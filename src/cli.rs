use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Terms to search for; all terms are searched in every file
    #[clap(required = true)]
    pub terms: Vec<String>,

    /// File or directory to search
    #[clap(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Treat terms as regular expressions instead of literals
    #[clap(short = 'e', long)]
    pub regex: bool,

    /// Match whole words only
    #[clap(short, long)]
    pub whole_word: bool,

    /// Case-sensitive matching (default is case-insensitive)
    #[clap(short = 's', long)]
    pub case_sensitive: bool,

    /// Let regex matches span line/page/slide boundaries
    #[clap(short, long)]
    pub multiline: bool,

    /// Let `.` match newline characters within a single unit
    #[clap(long)]
    pub dot_all: bool,

    /// Only report files in which every term matches at least once
    #[clap(long)]
    pub all_terms: bool,

    /// Recurse into subdirectories
    #[clap(short, long)]
    pub recursive: bool,

    /// Include hidden files and ignore-listed paths
    #[clap(long)]
    pub hidden: bool,

    /// Restrict the scan to these extensions (comma-separated, no dots)
    #[clap(long, value_parser, use_value_delimiter = true)]
    pub extensions: Option<Vec<String>>,

    /// Skip files larger than this many megabytes
    #[clap(long)]
    pub max_size: Option<u64>,

    /// Write the log to a file instead of stderr
    #[clap(long, value_parser)]
    pub log: Option<PathBuf>,

    /// Log at debug level
    #[clap(long)]
    pub verbose: bool,
}
