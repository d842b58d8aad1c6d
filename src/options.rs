use crate::cancel::CancelToken;

/// Matching configuration for one search invocation.
///
/// Immutable for the duration of a search and shared (by clone, the cancel
/// token is the only shared state) across all recursive and parallel
/// extractor invocations, so a single cancellation propagates everywhere.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Wrap each term in word-boundary assertions.
    pub whole_word: bool,
    /// Treat terms as regular expressions; otherwise they are escaped and
    /// matched literally.
    pub use_regex: bool,
    /// Cross-unit regex mode: unit boundaries are ignored and the whole
    /// document is searched as one newline-joined string.
    pub multiline: bool,
    /// Keep a file's results only if every term matched at least once in it.
    pub match_all_terms: bool,
    /// Case-insensitive matching.
    pub case_insensitive: bool,
    /// `.` also matches `\n` in single-unit mode.
    pub dot_matches_newline: bool,
    /// Shared cooperative cancellation signal.
    pub cancel: CancelToken,
}

impl SearchOptions {
    /// Case-insensitive literal search, the common default.
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }
}
