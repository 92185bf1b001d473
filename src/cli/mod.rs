//! CLI interface for elscan.
//!
//! Provides command-line argument parsing using clap.

use clap::{Parser, Subcommand, ValueEnum};

use crate::els::{SortKey, SortOrder};
use crate::provider::SAMPLE_SOURCE;

/// Default number of results printed.
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Largest value `analyze` accepts; factoring is trial division up to √n.
pub const MAX_ANALYZE_VALUE: u64 = 1 << 40;

/// Reading direction(s) to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DirectionArg {
    #[default]
    Forward,
    Backward,
    Both,
}

impl DirectionArg {
    /// `(search_forward, search_backward)` flags.
    #[must_use]
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::Forward => (true, false),
            Self::Backward => (false, true),
            Self::Both => (true, true),
        }
    }
}

/// Search tunables shared by `search` and `crossings`. Unset flags fall
/// back to the `[search]` section of the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SearchArgs {
    /// Text source to search (e.g. "genesis", "torah", "sample").
    #[arg(short, long, default_value = SAMPLE_SOURCE)]
    pub source: String,

    /// Smallest skip distance to probe.
    #[arg(long)]
    pub min_skip: Option<usize>,

    /// Largest skip distance to probe.
    #[arg(long)]
    pub max_skip: Option<usize>,

    /// Reading direction.
    #[arg(short, long)]
    pub direction: Option<DirectionArg>,

    /// Stop once this many results are found.
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Give up after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Start positions scanned between progress updates.
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

/// Command-line interface for elscan.
#[derive(Parser)]
#[command(name = "elscan")]
#[command(author, version, about = "Equidistant letter sequence search over Hebrew texts", long_about = None)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search a text for a term at equal letter intervals.
    Search {
        /// Hebrew search term (2 to 20 letters; vowel marks are ignored).
        term: String,

        #[command(flatten)]
        search: SearchArgs,

        /// Order results by this field.
        #[arg(long)]
        sort: Option<SortKey>,

        /// Sort direction.
        #[arg(long)]
        order: Option<SortOrder>,

        /// Maximum number of results to print.
        #[arg(short, long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,

        /// Print the full result set as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Find where the sequences of two terms share letters.
    Crossings {
        /// First Hebrew term.
        first: String,

        /// Second Hebrew term.
        second: String,

        #[command(flatten)]
        search: SearchArgs,

        /// Maximum number of crossings to print.
        #[arg(short, long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,

        /// Print crossings as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute the gematria of a word under every method.
    Gematria {
        /// Hebrew text.
        text: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Numeric properties of a value (primality, roots, factors).
    Analyze {
        #[arg(value_parser = clap::value_parser!(u64).range(..=MAX_ANALYZE_VALUE))]
        value: u64,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a term is acceptable for searching.
    Validate {
        term: String,
    },

    /// Letter statistics of a text source.
    Stats {
        /// Text source (e.g. "genesis", "sample").
        #[arg(short, long, default_value = SAMPLE_SOURCE)]
        source: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the text sources that can be searched.
    Sources,

    /// Start the MCP server for AI editor integration.
    #[cfg(feature = "mcp")]
    Serve,
}
