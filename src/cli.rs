//! Command-line surface of the `wirecheck` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wirecheck::cards::AccessLevel;

#[derive(Parser, Debug)]
#[command(
    name = "wirecheck",
    version,
    about = "Wire-harness continuity tester with an RFID-gated interlock"
)]
pub struct Cli {
    /// Use the simulated rig even when built with the `rpi` feature
    #[arg(long, global = true)]
    pub sim: bool,

    /// Defaults to `run` with the built-in harness
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run { config: None })
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Scan until `quit`, end of input, Ctrl+C or SIGTERM
    Run {
        /// System config (JSON); defaults are used when omitted
        config: Option<PathBuf>,
    },

    /// Discover the harness wiring and write a config from it
    Teach {
        /// Config file to write
        out: PathBuf,

        #[arg(long, default_value = "Taught harness")]
        product_name: String,

        #[arg(long, default_value = "TAUGHT")]
        product_no: String,
    },

    /// Manage the authorized card file
    Cards {
        /// Card registry (JSON)
        file: PathBuf,

        #[command(subcommand)]
        action: CardCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CardCommands {
    /// Print every registered card
    List,

    /// Register a card
    Add {
        id: String,
        name: String,

        #[arg(long, value_enum, default_value_t = AccessLevel::Operator)]
        level: AccessLevel,
    },

    /// Remove a card
    Remove { id: String },
}
