//! Command-line flags for applications built on the framework
//!
//! * `--config <dir>` configuration directory (default `config`)
//! * `--views <dir>` views directory, overriding `views.directory`
//! * `--env <name>` environment overlay (`dev`, `prod`, ...)
//!
//! Parsing uses `clap` with the `cli` feature and a small hand-written parser otherwise.

use crate::error::{Error, Result};
use std::path::PathBuf;

#[cfg(feature = "cli")]
use clap::{Arg, Command};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config_dir: Option<PathBuf>,
    pub views_directory: Option<PathBuf>,
    pub environment: Option<String>,
    pub help: bool,
}

impl CliArgs {
    /// Parse the process arguments
    #[cfg(feature = "cli")]
    pub fn parse() -> Result<Self> {
        let app = Command::new("base-app")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Base web application")
            .arg(
                Arg::new("config")
                    .long("config")
                    .short('c')
                    .value_name("DIR")
                    .help("Configuration directory")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("views")
                    .long("views")
                    .short('v')
                    .value_name("DIR")
                    .help("Views directory")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("env")
                    .long("env")
                    .short('e')
                    .value_name("NAME")
                    .help("Configuration environment overlay"),
            );

        let matches = app.try_get_matches().map_err(|e| {
            Error::config(format!("Failed to parse command line arguments: {}", e))
        })?;

        Ok(CliArgs {
            config_dir: matches.get_one::<PathBuf>("config").cloned(),
            views_directory: matches.get_one::<PathBuf>("views").cloned(),
            environment: matches.get_one::<String>("env").cloned(),
            help: false,
        })
    }

    /// Parse the process arguments
    #[cfg(not(feature = "cli"))]
    pub fn parse() -> Result<Self> {
        let args = Self::parse_from(std::env::args().skip(1))?;
        if args.help {
            Self::print_help();
            std::process::exit(0);
        }
        Ok(args)
    }

    /// Hand-written parser over arguments without the program name
    pub fn parse_from<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with('-') => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg, None),
            };

            let mut value = |name: &str| -> Result<String> {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| Error::config(format!("{} flag requires a value", name)))
            };

            match flag.as_str() {
                "--config" | "-c" => parsed.config_dir = Some(PathBuf::from(value("--config")?)),
                "--views" | "-v" => {
                    parsed.views_directory = Some(PathBuf::from(value("--views")?))
                }
                "--env" | "-e" => parsed.environment = Some(value("--env")?),
                "--help" | "-h" => parsed.help = true,
                other => log::debug!("Ignoring unknown argument '{}'", other),
            }
        }

        Ok(parsed)
    }

    #[cfg(not(feature = "cli"))]
    fn print_help() {
        let program = std::env::args().next().unwrap_or_else(|| "base-app".to_string());
        println!("Base web application");
        println!();
        println!("USAGE:");
        println!("    {} [OPTIONS]", program);
        println!();
        println!("OPTIONS:");
        println!("    -c, --config <DIR>     Configuration directory");
        println!("    -v, --views <DIR>      Views directory");
        println!("    -e, --env <NAME>       Configuration environment overlay");
        println!("    -h, --help             Print help information");
    }

    pub fn config_dir(&self) -> Option<&PathBuf> {
        self.config_dir.as_ref()
    }

    pub fn views_path(&self) -> Option<&PathBuf> {
        self.views_directory.as_ref()
    }
}
