use crate::application::data::Threshold;
use crate::cli::{Cli, Command};
use crate::config::Settings;

/// Effective options for one invocation: command-line flags layered over the settings file.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command: Command,
    pub threshold: Threshold,
    pub relative_paths: bool,
}

impl RuntimeConfig {
    pub fn new(cli: Cli, settings: Settings) -> Self {
        let report = cli.command.report_args().cloned().unwrap_or_default();

        let threshold = report
            .threshold_mib
            .map(Threshold::from_mib)
            .or(settings.threshold)
            .unwrap_or_default();

        Self {
            command: cli.command,
            threshold,
            relative_paths: report.relative || settings.relative_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spaceguard").chain(args.iter().copied()))
            .expect("Failed to parse")
    }

    #[test]
    fn defaults_apply_without_flags_or_settings() {
        let config = RuntimeConfig::new(cli(&["diff", "a", "b"]), Settings::default());

        assert_eq!(config.threshold, Threshold::default());
        assert!(!config.relative_paths);
    }

    #[test]
    fn settings_apply_without_flags() {
        let settings = Settings {
            threshold: Some(Threshold::from_mib(3)),
            relative_paths: true,
        };

        let config = RuntimeConfig::new(cli(&["diff", "a", "b"]), settings);

        assert_eq!(config.threshold, Threshold::from_mib(3));
        assert!(config.relative_paths);
    }

    #[test]
    fn flags_override_settings() {
        let settings = Settings {
            threshold: Some(Threshold::from_mib(3)),
            relative_paths: false,
        };

        let config = RuntimeConfig::new(
            cli(&["compare", "saved", "--threshold-mib", "10", "--relative"]),
            settings,
        );

        assert_eq!(config.threshold, Threshold::from_mib(10));
        assert!(config.relative_paths);
    }
}
