// CLI module for argument parsing and configuration

use crate::domain::{MediaKind, DEFAULT_PAGE_SIZE};
use crate::logging::{default_log_path, Verbosity};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Upper bound for `--page-size`
pub const MAX_PAGE_SIZE: usize = 1000;

/// Photoburn - swipe through your photo library and burn what you don't need
///
/// Swipe left (or press ←) to move a photo to the trash, right (→) to keep it.
#[derive(Parser, Debug, Clone)]
#[command(name = "photoburn")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Library directory to review
    ///
    /// Defaults to the system Pictures folder, or the current directory if
    /// there is none.
    pub directory: Option<PathBuf>,

    /// Only show the given media type(s)
    ///
    /// Can be specified multiple times. Example: --type photo --type video
    #[arg(short = 't', long = "type", value_enum)]
    pub media_types: Vec<MediaTypeFilter>,

    /// Dry run mode - log trash operations without touching any file
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Seed for the shuffle, to replay the same order
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Number of items requested per page
    #[arg(long = "page-size", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Only scan the top level of the directory
    #[arg(long = "no-recursive", action = ArgAction::SetTrue)]
    pub no_recursive: bool,

    /// Include hidden files and folders (names starting with .)
    #[arg(long = "hidden", action = ArgAction::SetTrue)]
    pub show_hidden: bool,

    /// Review a generated in-memory library instead of a directory
    #[arg(long = "demo", action = ArgAction::SetTrue)]
    pub demo: bool,

    /// Debug-level logging
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Log file location
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaTypeFilter {
    /// Still images (jpg, png, heic, raw formats, ...)
    Photo,
    /// Video clips (mp4, mov, mkv, ...)
    Video,
}

impl From<MediaTypeFilter> for MediaKind {
    fn from(filter: MediaTypeFilter) -> Self {
        match filter {
            MediaTypeFilter::Photo => MediaKind::Photo,
            MediaTypeFilter::Video => MediaKind::Video,
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Requested media kinds; empty means both
    pub fn media_kinds(&self) -> Vec<MediaKind> {
        let mut kinds: Vec<MediaKind> = self.media_types.iter().map(|&t| t.into()).collect();
        kinds.dedup();
        kinds
    }

    /// The directory to review, after applying the default
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "Invalid page size: {}. Use a value between 1 and {}",
                self.page_size, MAX_PAGE_SIZE
            ));
        }

        if self.demo {
            return Ok(());
        }

        let directory = self.resolved_directory();
        if !directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                directory.display()
            ));
        }

        if !directory.is_dir() {
            return Err(format!("Path is not a directory: {}", directory.display()));
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub kinds: Vec<MediaKind>,
    pub dry_run: bool,
    pub seed: Option<u64>,
    pub page_size: usize,
    pub recursive: bool,
    pub show_hidden: bool,
    pub demo: bool,
    pub verbosity: Verbosity,
    pub log_file: PathBuf,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            directory: args.resolved_directory(),
            kinds: args.media_kinds(),
            dry_run: args.dry_run,
            seed: args.seed,
            page_size: args.page_size,
            recursive: !args.no_recursive,
            show_hidden: args.show_hidden,
            demo: args.demo,
            verbosity: Verbosity::from_flags(args.verbose, args.quiet),
            log_file: args.log_file.unwrap_or_else(default_log_path),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            directory: PathBuf::from("."),
            kinds: vec![],
            dry_run: false,
            seed: None,
            page_size: DEFAULT_PAGE_SIZE,
            recursive: true,
            show_hidden: false,
            demo: false,
            verbosity: Verbosity::Normal,
            log_file: default_log_path(),
        }
    }
}
