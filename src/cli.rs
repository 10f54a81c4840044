use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weatherly", version, about = "Terminal weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch once and print the forecast
    Show {
        /// City to look up; defaults to the IP-detected location
        city: Option<String>,
    },
    /// Validate config and test connections
    Check,
    /// Re-run interactive setup
    Init,
}

impl Cli {
    /// Filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "weatherly=debug",
            _ => "weatherly=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_city() {
        let cli = Cli::try_parse_from(["weatherly", "-v", "show", "Buenos Aires"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Commands::Show { city }) => assert_eq!(city.as_deref(), Some("Buenos Aires")),
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn no_command_means_dashboard() {
        let cli = Cli::try_parse_from(["weatherly", "--config", "w.yaml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("w.yaml")));
        assert_eq!(cli.default_log_filter(), "warn");
    }

    #[test]
    fn verbosity_levels() {
        let cli = Cli::try_parse_from(["weatherly", "-vv", "check"]).unwrap();
        assert_eq!(cli.default_log_filter(), "weatherly=trace");
    }
}
