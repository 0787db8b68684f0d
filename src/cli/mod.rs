use clap::{Args as ClapArgs, Parser, Subcommand};

pub mod record;
pub mod session;

pub use record::handle_record_command;
pub use session::handle_session_command;

#[derive(Parser, Debug)]
#[command(name = "minuter")]
#[command(about = "Meeting capture, transcription and summarization", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Record one session for a fixed duration and process it in-process
    Record(RecordCliArgs),
    /// Control a running minuter service over its HTTP API
    Session(SessionCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RecordCliArgs {
    /// Recording duration in seconds
    #[arg(short, long, default_value = "15")]
    pub duration: u64,
    /// Keep the captured WAV next to the text artifacts
    #[arg(long)]
    pub retain_audio: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SessionCliArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Start a capture session
    Start,
    /// Stop the session and process the capture
    Stop,
    /// Show the current session status
    Status,
}
