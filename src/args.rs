//! Command-line argument parsing and processing.
//!
//! This module parses argv by hand into a [`CliAction`] so the main logic
//! never touches raw arguments. Unknown options fall through to help with a
//! non-zero exit rather than being guessed at.

use crate::logger::Log;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// List every matching city, round-robin interleaved by country.
    All {
        target_hour: Option<u32>,
        min_population: Option<u64>,
        limit: Option<usize>,
    },
    /// Sample one matching city uniformly at random.
    Random {
        target_hour: Option<u32>,
        min_population: Option<u64>,
    },
    /// Rebuild the timezone partitions from the gazetteer files.
    Rebuild { force: bool },
    /// Display help information and exit.
    ShowHelp,
    /// Display version information and exit.
    ShowVersion,
    /// Show help due to unknown arguments and exit non-zero.
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from
    ///   `std::env::args()`)
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let Some(command) = args_vec.first() else {
            // No subcommand: default to a random pick with config defaults
            return ParsedArgs {
                action: CliAction::Random {
                    target_hour: None,
                    min_population: None,
                },
            };
        };

        let action = match command.as_str() {
            "--help" | "-h" | "help" => CliAction::ShowHelp,
            "--version" | "-V" | "-v" | "version" => CliAction::ShowVersion,
            "all" => Self::parse_all(&args_vec[1..]),
            "random" => Self::parse_random(&args_vec[1..]),
            "rebuild" => Self::parse_rebuild(&args_vec[1..]),
            other => {
                Log::log_error(&format!("Unknown command: {}", other));
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    fn parse_all(args: &[String]) -> CliAction {
        let mut target_hour = None;
        let mut min_population = None;
        let mut limit = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--hour" => match Self::parse_value(args, &mut i, "--hour") {
                    Some(value) => target_hour = Some(value),
                    None => return CliAction::ShowHelpDueToError,
                },
                "--pop" => match Self::parse_value(args, &mut i, "--pop") {
                    Some(value) => min_population = Some(value),
                    None => return CliAction::ShowHelpDueToError,
                },
                "--limit" => match Self::parse_value(args, &mut i, "--limit") {
                    Some(value) => limit = Some(value),
                    None => return CliAction::ShowHelpDueToError,
                },
                other => {
                    Log::log_error(&format!("Unknown option for 'all': {}", other));
                    return CliAction::ShowHelpDueToError;
                }
            }
            i += 1;
        }

        CliAction::All {
            target_hour,
            min_population,
            limit,
        }
    }

    fn parse_random(args: &[String]) -> CliAction {
        let mut target_hour = None;
        let mut min_population = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--hour" => match Self::parse_value(args, &mut i, "--hour") {
                    Some(value) => target_hour = Some(value),
                    None => return CliAction::ShowHelpDueToError,
                },
                "--pop" => match Self::parse_value(args, &mut i, "--pop") {
                    Some(value) => min_population = Some(value),
                    None => return CliAction::ShowHelpDueToError,
                },
                other => {
                    Log::log_error(&format!("Unknown option for 'random': {}", other));
                    return CliAction::ShowHelpDueToError;
                }
            }
            i += 1;
        }

        CliAction::Random {
            target_hour,
            min_population,
        }
    }

    fn parse_rebuild(args: &[String]) -> CliAction {
        let mut force = false;
        for arg in args {
            match arg.as_str() {
                "--force" | "-f" => force = true,
                other => {
                    Log::log_error(&format!("Unknown option for 'rebuild': {}", other));
                    return CliAction::ShowHelpDueToError;
                }
            }
        }
        CliAction::Rebuild { force }
    }

    /// Read the value following a flag, advancing the cursor.
    fn parse_value<T: std::str::FromStr>(
        args: &[String],
        i: &mut usize,
        flag: &str,
    ) -> Option<T> {
        let Some(raw) = args.get(*i + 1) else {
            Log::log_error(&format!("{} requires a value", flag));
            return None;
        };
        *i += 1;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                Log::log_error(&format!("Invalid value for {}: {}", flag, raw));
                None
            }
        }
    }
}

/// Display the help message.
pub fn display_help() {
    println!("hourspot v{}", env!("CARGO_PKG_VERSION"));
    println!("Find the cities where the local clock currently reads a given hour");
    println!();
    println!("Usage: hourspot [COMMAND] [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  random            Pick one matching city at random (default)");
    println!("  all               List every matching city, interleaved by country");
    println!("  rebuild           Rebuild the timezone partitions");
    println!("  help              Show this help message");
    println!("  version           Show version information");
    println!();
    println!("Options (all, random):");
    println!("  --hour <0-23>     Local hour to match (default from config)");
    println!("  --pop <N>         Starting population floor (default from config)");
    println!("  --limit <N>       Cap the result list ('all' only)");
    println!();
    println!("Options (rebuild):");
    println!("  --force, -f       Rebuild partitions even if they exist");
}

/// Display version information.
pub fn display_version() {
    println!("hourspot v{}", env!("CARGO_PKG_VERSION"));
}
