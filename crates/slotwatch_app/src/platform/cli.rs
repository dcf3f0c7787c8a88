use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Check activity pages for open registration slots and mail a summary.
#[derive(Debug, Parser)]
#[command(name = "slotwatch", version)]
pub struct Cli {
    /// RON file overriding the default listing URL, selectors, timeouts and SMTP endpoint.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How pages are loaded.
    #[arg(long, value_enum, default_value_t = Backend::Chromium)]
    pub backend: Backend,

    /// Chromium/Chrome binary; found on PATH when omitted.
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Also append log output to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log every probe decision.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Headless Chromium; renders scripts.
    Chromium,
    /// Plain HTTP; static HTML only.
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backend_defaults_to_chromium() {
        let cli = Cli::try_parse_from(["slotwatch"]).unwrap();
        assert_eq!(cli.backend, Backend::Chromium);
        assert!(!cli.verbose);

        let cli = Cli::try_parse_from(["slotwatch", "--backend", "http", "-v"]).unwrap();
        assert_eq!(cli.backend, Backend::Http);
        assert!(cli.verbose);
    }
}
