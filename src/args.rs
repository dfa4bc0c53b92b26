use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use page_chat::Role;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-chat")]
#[command(about = "Extract page content and keep per-page chat transcripts")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Transcript history file (overrides the configuration)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// WebDriver server URL (overrides the configuration and WEBDRIVER_URL)
    #[arg(long, global = true)]
    pub webdriver: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the extraction response for a page as JSON
    Extract {
        /// Page URL
        url: String,

        /// Read the page source from this file instead of a browser
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print a JSON line whenever the page content changes
    Watch {
        /// Page URL
        url: String,
    },

    /// Format markdown read from stdin
    Format,

    /// Append a message to today's transcript for a page
    Say {
        /// Page URL
        url: String,

        /// Message text
        message: String,

        /// Author of the message
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,

        /// Treat the message as JSON: a string, `{role, content}`, or a
        /// backend reply `{response}`. The role comes from the message.
        #[arg(long)]
        json: bool,

        /// Show the message without saving it
        #[arg(long)]
        no_persist: bool,
    },

    /// Print the saved transcript for a page
    History {
        /// Page URL
        url: String,

        /// Day to read (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    User,
    Bot,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::User => Role::User,
            RoleArg::Bot => Role::Bot,
        }
    }
}
