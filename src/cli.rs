use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::inspect::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_PREVIEW_BYTES, InspectOptions};
use crate::io::HttpOptions;

#[derive(Parser, Debug)]
#[command(name = "contest-preview")]
#[command(version)]
#[command(about = "Preview contest submissions and follow the contest timer", long_about = None)]
#[command(after_help = "Examples:\n  \
  contest-preview tree storage/uploads/3f2a/submission.zip\n  \
  contest-preview show submission.zip src/main.rs\n  \
  contest-preview tree https://portal.local/files/submission.zip\n  \
  contest-preview watch --url http://localhost:8080/api/state")]
pub struct Cli {
    #[command(flatten)]
    pub limits: Limits,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List an archive as a folder-first tree
    Tree {
        /// Archive path or HTTP URL
        #[arg(value_name = "FILE")]
        file: String,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview a file, or one entry inside a ZIP archive
    Show {
        /// File or archive path, or HTTP URL
        #[arg(value_name = "FILE")]
        file: String,

        /// Entry path inside the archive
        #[arg(value_name = "ENTRY")]
        entry: Option<String>,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow the contest countdown
    Watch {
        /// State endpoint to poll; reads JSON lines from stdin when absent
        #[arg(long, env = "CONTEST_PREVIEW_STATE_URL")]
        url: Option<String>,

        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,

        /// Milliseconds between countdown evaluations
        #[arg(long, default_value_t = 250)]
        cadence_ms: u64,
    },
}

/// Limits shared by all subcommands.
#[derive(Args, Debug)]
pub struct Limits {
    /// Largest excerpt shown by a preview, in bytes
    #[arg(long, global = true, env = "CONTEST_PREVIEW_MAX_BYTES", default_value_t = DEFAULT_MAX_PREVIEW_BYTES)]
    pub max_bytes: usize,

    /// Largest number of entries an archive may list
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ENTRIES)]
    pub max_entries: u64,

    /// HTTP timeout in seconds
    #[arg(long, global = true, env = "CONTEST_PREVIEW_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    /// Attempts per HTTP range request
    #[arg(long, global = true, env = "CONTEST_PREVIEW_HTTP_RETRIES", default_value_t = 10)]
    pub http_retries: u32,
}

impl Limits {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.http_timeout.max(1)),
            max_retry: self.http_retries,
        }
    }

    pub fn inspect_options(&self) -> InspectOptions {
        InspectOptions {
            max_preview_bytes: self.max_bytes,
            max_entries: self.max_entries,
            http: self.http_options(),
        }
    }
}
