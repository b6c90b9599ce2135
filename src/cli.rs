use std::path::PathBuf;

use crate::config::Configuration;
use crate::error::AppError;

pub const USAGE: &str = "\
Usage: screencolor [CONFIG_FILE] [OPTIONS]

Options:
  --transition-duration <SECS>  Color transition duration in seconds
  --update-interval <SECS>      Screen color update interval in seconds
  --capture-interval <SECS>     Screen capture interval in seconds
  -h, --help                    Print this help";

/// Command line options. Anything given here wins over the config file and
/// `SCREENCOLOR__*` variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandLine {
    pub config_path: Option<PathBuf>,
    pub transition_duration_secs: Option<f64>,
    pub update_interval_secs: Option<f64>,
    pub capture_interval_secs: Option<f64>,
    pub show_help: bool,
}

impl CommandLine {
    /// Parses the arguments after the program name. Accepts both
    /// `--flag value` and `--flag=value`.
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut command_line = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "-h" | "--help" => command_line.show_help = true,
                "--transition-duration" => {
                    let value = seconds(&flag, inline_value.or_else(|| args.next()))?;
                    command_line.transition_duration_secs = Some(value);
                }
                "--update-interval" => {
                    let value = seconds(&flag, inline_value.or_else(|| args.next()))?;
                    command_line.update_interval_secs = Some(value);
                }
                "--capture-interval" => {
                    let value = seconds(&flag, inline_value.or_else(|| args.next()))?;
                    command_line.capture_interval_secs = Some(value);
                }
                path if !path.starts_with('-') => {
                    if command_line.config_path.is_some() {
                        return Err(invalid("only one config file may be given"));
                    }
                    command_line.config_path = Some(PathBuf::from(path));
                }
                _ => return Err(invalid(format!("unknown option '{}'", arg))),
            }
        }

        Ok(command_line)
    }

    /// Writes the given overrides into `configuration`; range checks are
    /// left to [`Configuration::validate`].
    pub fn apply(&self, configuration: &mut Configuration) {
        let pipeline = &mut configuration.pipeline;
        if let Some(secs) = self.transition_duration_secs {
            pipeline.transition_duration_secs = secs;
        }
        if let Some(secs) = self.update_interval_secs {
            pipeline.update_interval_secs = secs;
        }
        if let Some(secs) = self.capture_interval_secs {
            pipeline.capture_interval_secs = secs;
        }
    }
}

fn seconds(flag: &str, value: Option<String>) -> Result<f64, AppError> {
    let value = value.ok_or_else(|| invalid(format!("{} needs a value in seconds", flag)))?;
    value
        .parse::<f64>()
        .map_err(|_| invalid(format!("{} expects seconds, got '{}'", flag, value)))
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Configuration(message.into())
}
