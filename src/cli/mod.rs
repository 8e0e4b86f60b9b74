use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::navigation::parse_date;

pub mod status;
pub use status::StatusDisplay;

/// Daily Mass readings in the terminal, with the gospel read aloud
#[derive(Parser)]
#[command(name = "liturgy")]
#[command(about = "Read the daily Mass readings and listen to the gospel")]
#[command(version)]
pub struct CliApp {
    /// Use this configuration file instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// One-shot commands. Without one the reader starts in interactive mode.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the readings of a day
    Read {
        /// Day to read (YYYY-MM-DD), today by default
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Print a short reflection on the gospel of a day
    Reflect {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Read the gospel aloud until it ends (Ctrl-C stops)
    Play {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// List audio output devices
    Devices,
}

/// Commands accepted at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCommand {
    Today,
    Next,
    Previous,
    Date(NaiveDate),
    /// Show the readings view
    Read,
    /// Show the reflection view
    Reflect,
    /// Play, pause or resume the gospel
    Toggle,
    Status,
    /// Fetch the current day again after a failure
    Retry,
    Volume(u8),
    Devices,
    Exit,
}

fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    parse_date(input).ok_or_else(|| format!("'{}' is not a date in YYYY-MM-DD form", input))
}

impl CliApp {
    pub fn parse() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Parse one line typed at the interactive prompt
    pub fn parse_command(input: &str) -> Result<ReaderCommand, ParseError> {
        let args: Vec<&str> = input.split_whitespace().collect();
        if args.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        let command = args[0].to_lowercase();
        match command.as_str() {
            "today" => Ok(ReaderCommand::Today),
            "next" => Ok(ReaderCommand::Next),
            "prev" | "previous" => Ok(ReaderCommand::Previous),
            "date" => {
                let value = args.get(1).ok_or_else(|| ParseError::MissingArgument {
                    command: "date".to_string(),
                    argument: "YYYY-MM-DD".to_string(),
                })?;
                parse_date(value)
                    .map(ReaderCommand::Date)
                    .ok_or_else(|| ParseError::InvalidDate {
                        input: value.to_string(),
                    })
            }
            "read" | "readings" => Ok(ReaderCommand::Read),
            "reflect" | "reflection" => Ok(ReaderCommand::Reflect),
            "play" | "pause" | "toggle" => Ok(ReaderCommand::Toggle),
            "status" => Ok(ReaderCommand::Status),
            "retry" => Ok(ReaderCommand::Retry),
            "volume" => {
                let value = args.get(1).ok_or_else(|| ParseError::MissingArgument {
                    command: "volume".to_string(),
                    argument: "level".to_string(),
                })?;
                match value.parse::<u8>() {
                    Ok(level) if level <= 100 => Ok(ReaderCommand::Volume(level)),
                    Ok(_) => Err(ParseError::InvalidArgument {
                        argument: "volume level".to_string(),
                        value: value.to_string(),
                        expected: "0-100".to_string(),
                    }),
                    Err(_) => Err(ParseError::InvalidArgument {
                        argument: "volume level".to_string(),
                        value: value.to_string(),
                        expected: "number 0-100".to_string(),
                    }),
                }
            }
            "devices" => Ok(ReaderCommand::Devices),
            "exit" | "quit" => Ok(ReaderCommand::Exit),
            "help" | "?" => Err(ParseError::HelpRequested),
            _ => Err(ParseError::UnknownCommand {
                command: args[0].to_string(),
            }),
        }
    }

    pub fn display_help() {
        println!("Liturgy Reader - Available Commands:");
        println!();
        println!("Days:");
        println!("  today             - Go back to today's readings");
        println!("  next              - Readings of the following day");
        println!("  prev              - Readings of the previous day");
        println!("  date <YYYY-MM-DD> - Jump to a specific day");
        println!("  retry             - Fetch the current day again");
        println!();
        println!("Views:");
        println!("  read              - Show the readings");
        println!("  reflect           - Show a short reflection on the gospel");
        println!();
        println!("Listening:");
        println!("  play, pause       - Read the gospel aloud, pause or resume");
        println!("  status            - Show playback position");
        println!("  volume <0-100>    - Set volume level");
        println!("  devices           - List audio output devices");
        println!();
        println!("General:");
        println!("  help              - Show this help message");
        println!("  exit, quit        - Leave the reader");
    }
}

/// Interactive command parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Missing argument for {command}: {argument}")]
    MissingArgument { command: String, argument: String },

    #[error("Invalid argument {argument}: got '{value}', expected {expected}")]
    InvalidArgument {
        argument: String,
        value: String,
        expected: String,
    },

    #[error("Invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Help requested")]
    HelpRequested,
}

#[cfg(test)]
mod tests;
