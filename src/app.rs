//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the appropriate
//! command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A terminal voice scribe for clinicians: record, transcribe, and generate
/// structured diagnosis notes.
#[derive(Parser)]
#[command(name = "tabib")]
#[command(version)]
#[command(about = "Clinician voice scribe: record dictation, transcribe it, generate a diagnosis note")]
#[command(
    long_about = "A terminal voice scribe for clinicians.\n\nRecord dictation from the microphone with a live waveform, transcribe it\nwith the configured speech endpoint, and turn the transcript into a\nstructured diagnosis note with fixed section headings.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' starts the interactive pipeline.\n\nEXAMPLES:\n    # Interactive pipeline (record, transcribe, generate, export)\n    $ tabib\n\n    # Transcribe an existing WAV file\n    $ tabib transcribe visit.wav -o transcript.txt\n\n    # Generate a note from a transcript file\n    $ tabib generate transcript.txt\n\n    # Edit configuration file\n    $ tabib config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/tabib/tabib.toml\n    Logs:               ~/.local/state/tabib/tabib.log.*\n\nAPI keys are read from the environment variables named in the config file."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record dictation with real-time visualization (default)
    ///
    /// Space starts/stops recording, Enter transcribes, 'g' generates the
    /// diagnosis note, 'p' plays back, 'e' exports, 'n' resets, q quits.
    #[command(visible_alias = "r")]
    Record,

    /// Transcribe a pre-recorded WAV file
    ///
    /// Examples:
    ///   tabib transcribe visit.wav
    ///   tabib transcribe visit.wav -o transcript.txt
    #[command(visible_alias = "t")]
    Transcribe {
        /// Path to the WAV file to transcribe
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write transcript to file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Generate a diagnosis note from a transcript file
    ///
    /// Reads dictation text and produces a note with the configured section
    /// headings. Use '-' to read from stdin.
    ///
    /// Examples:
    ///   tabib generate transcript.txt
    ///   cat transcript.txt | tabib generate - -o note.txt
    #[command(visible_alias = "g")]
    Generate {
        /// Path to the transcript text file, or '-' for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write note to file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio settings, endpoints, and section headings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in tabib.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   tabib completions bash > tabib.bash
    ///   tabib completions zsh > _tabib
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "tabib", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record().await?;
        }
        Some(Commands::Transcribe { file, output }) => {
            commands::handle_transcribe(file, output).await?;
        }
        Some(Commands::Generate { file, output }) => {
            commands::handle_generate(file, output).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
