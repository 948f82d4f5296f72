use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::models::{Language, SortColumn, Theme};

/// Keep monthly invoice books and re-enter them into the Portal das Finanças form.
#[derive(Parser, Debug)]
pub struct Args {
    /// Directory holding config.json
    #[clap(long, env = "FATURAS_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone, Copy)]
pub struct PeriodArgs {
    /// Year of the invoice book (defaults to the current year)
    #[clap(long)]
    pub year: Option<i32>,

    /// Month of the invoice book, 1-12 (defaults to the current month)
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DraftArgs {
    /// Invoice number (defaults to the next one in sequence)
    #[clap(long)]
    pub number: Option<String>,

    /// ATCUD code (defaults to the next one in sequence)
    #[clap(long)]
    pub atcud: Option<String>,

    /// Buyer tax id
    #[clap(long, default_value = "")]
    pub nif: String,

    /// Day of the month (defaults to today, clamped to the month)
    #[clap(long)]
    pub day: Option<u32>,

    /// Amount in euros; "12,50" and "12.50" are both accepted
    #[clap(long)]
    pub amount: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the invoices of a month
    List {
        #[clap(flatten)]
        period: PeriodArgs,

        /// Only show invoices containing this text
        #[clap(long)]
        search: Option<String>,

        #[clap(long, value_enum, default_value = "number")]
        sort: SortColumn,

        /// Sort descending
        #[clap(long)]
        desc: bool,
    },

    /// Add one invoice at the end of the month
    Add {
        #[clap(flatten)]
        period: PeriodArgs,

        #[clap(flatten)]
        draft: DraftArgs,
    },

    /// Enter invoices one after another, numbering them automatically
    Entry {
        #[clap(flatten)]
        period: PeriodArgs,
    },

    /// Insert an invoice after position N (1-based) and renumber the ones behind it
    Insert {
        #[clap(flatten)]
        period: PeriodArgs,

        #[clap(long)]
        after: usize,

        #[clap(flatten)]
        draft: DraftArgs,
    },

    /// Change fields of an invoice
    Edit {
        #[clap(flatten)]
        period: PeriodArgs,

        id: String,

        #[clap(long)]
        number: Option<String>,

        #[clap(long)]
        atcud: Option<String>,

        #[clap(long)]
        nif: Option<String>,

        #[clap(long)]
        date: Option<String>,

        #[clap(long)]
        amount: Option<String>,
    },

    /// Remove an invoice
    Delete {
        #[clap(flatten)]
        period: PeriodArgs,

        id: String,
    },

    /// List the months that have an invoice file
    Periods,

    /// Open a month's invoice file with the system handler
    Open {
        #[clap(flatten)]
        period: PeriodArgs,
    },

    /// Submit a month's invoices to the portal through a WebDriver browser
    Submit {
        #[clap(flatten)]
        period: PeriodArgs,

        /// WebDriver endpoint, e.g. http://localhost:4444
        #[clap(long, env = "FATURAS_WEBDRIVER_URL")]
        webdriver: Option<String>,

        /// Start auto submission right away
        #[clap(long)]
        auto: bool,

        /// First invoice to work on (1-based)
        #[clap(long, default_value_t = 1)]
        start: i64,
    },

    /// Show or change the workspace folder
    Workspace {
        #[clap(subcommand)]
        action: Option<WorkspaceAction>,
    },

    /// Show or change the theme
    Theme {
        #[clap(value_enum)]
        set: Option<Theme>,
    },

    /// Show or change the language
    Language {
        #[clap(value_enum)]
        set: Option<Language>,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceAction {
    /// Print the current workspace folder
    Show,

    /// Use an existing directory as workspace
    Set { folder: PathBuf },

    /// Choose the workspace with a folder dialog
    Pick,
}

pub fn parse() -> Args {
    Args::parse()
}
