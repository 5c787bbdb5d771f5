use clap::builder::PossibleValuesParser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Argument ids read back from the matches.
pub const ARG_FILE: &str = "file";
pub const ARG_HEADLESS: &str = "headless";
pub const ARG_EXERCISE: &str = "exercise";
pub const ARG_LOG_LEVEL: &str = "log-level";
pub const ARG_LOG_FILE: &str = "log-file";

fn config_args() -> Vec<Arg> {
    return vec![
        Arg::new(ConfigKey::ConfigFile.to_string())
            .long(ConfigKey::ConfigFile.to_string())
            .env("NEXIA_CONFIG_FILE")
            .num_args(1)
            .global(true)
            .help(format!(
                "Path to the config file. [default: {}]",
                Config::default(ConfigKey::ConfigFile)
            )),
        Arg::new(ConfigKey::ApiUrl.to_string())
            .long(ConfigKey::ApiUrl.to_string())
            .env("NEXIA_API_URL")
            .num_args(1)
            .global(true)
            .help(format!(
                "Base URL of the Nexia backend. [default: {}]",
                Config::default(ConfigKey::ApiUrl)
            )),
        Arg::new(ConfigKey::AccessToken.to_string())
            .long(ConfigKey::AccessToken.to_string())
            .env("NEXIA_ACCESS_TOKEN")
            .num_args(1)
            .global(true)
            .hide_env_values(true)
            .help("Bearer token sent with every backend request."),
        Arg::new(ConfigKey::RequestTimeout.to_string())
            .long(ConfigKey::RequestTimeout.to_string())
            .env("NEXIA_REQUEST_TIMEOUT")
            .num_args(1)
            .global(true)
            .help(format!(
                "Backend request timeout in milliseconds. [default: {}]",
                Config::default(ConfigKey::RequestTimeout)
            )),
        Arg::new(ConfigKey::Runtime.to_string())
            .long(ConfigKey::Runtime.to_string())
            .short('r')
            .env("NEXIA_RUNTIME")
            .num_args(1)
            .global(true)
            .value_parser(PossibleValuesParser::new(
                Config::runtime_names().iter().copied(),
            ))
            .help(format!(
                "Runtime that executes the code. [default: {}]",
                Config::default(ConfigKey::Runtime)
            )),
    ];
}

fn subcommand_run() -> Command {
    return Command::new("run")
        .about("Runs a file in the console. Interactive unless --headless is set.")
        .arg(
            Arg::new(ARG_FILE)
                .required(true)
                .help("Source file to execute."),
        )
        .arg(
            Arg::new(ARG_HEADLESS)
                .long(ARG_HEADLESS)
                .action(ArgAction::SetTrue)
                .help("Run once without the terminal UI. Output goes to stdout, input is read from stdin."),
        )
        .arg(
            Arg::new(ARG_EXERCISE)
                .long(ARG_EXERCISE)
                .num_args(1)
                .help("Exercise id. Successful runs are submitted to the backend for it."),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand_required(true)
        .subcommand(
            Command::new("default").about("Prints the default config file to stdout."),
        );
}

pub fn build() -> Command {
    return Command::new("nexia")
        .about("Embedded interpreter console for the Nexia learning platform.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(config_args())
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .env("NEXIA_LOG_LEVEL")
                .num_args(1)
                .global(true)
                .default_value("info")
                .value_parser(PossibleValuesParser::new([
                    "trace", "debug", "info", "warn", "error",
                ]))
                .help("Log level written to the log file."),
        )
        .arg(
            Arg::new(ARG_LOG_FILE)
                .long(ARG_LOG_FILE)
                .env("NEXIA_LOG_FILE")
                .num_args(1)
                .global(true)
                .default_value("nexia.log")
                .help("File the logs are written to."),
        )
        .subcommand(subcommand_run())
        .subcommand(subcommand_config());
}
