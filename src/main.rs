mod args;
mod commands;
mod db;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use console::style;
use tracing::Level;

use crate::args::Command;
use crate::db::config::ConfigStore;
use crate::services::state::{AppState, HostApi};

#[tokio::main]
async fn main() -> Result<()> {
    let args = args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => ConfigStore::default_dir()?,
    };
    let store = ConfigStore::new(&config_dir);
    tracing::debug!(config = %store.path().display(), "loading configuration");
    let state = AppState::new(store);

    if needs_workspace(&args.command) && state.get_folder().is_none() && state.pick_folder().is_none() {
        let strings = state.get_strings();
        eprintln!(
            "{}",
            style(strings.get("workspace_required", "Choose a workspace folder first")).red()
        );
        std::process::exit(2);
    }

    match args.command {
        Command::List {
            period,
            search,
            sort,
            desc,
        } => commands::invoices::list(&state, period, search, sort, desc),
        Command::Add { period, draft } => commands::invoices::add(&state, period, draft),
        Command::Entry { period } => commands::invoices::entry(&state, period),
        Command::Insert { period, after, draft } => {
            commands::invoices::insert(&state, period, after, draft)
        }
        Command::Edit {
            period,
            id,
            number,
            atcud,
            nif,
            date,
            amount,
        } => commands::invoices::edit(&state, period, &id, number, atcud, nif, date, amount),
        Command::Delete { period, id } => commands::invoices::delete(&state, period, &id),
        Command::Periods => commands::invoices::periods(&state),
        Command::Open { period } => commands::invoices::open_file(&state, period),
        Command::Submit {
            period,
            webdriver,
            auto,
            start,
        } => commands::submission::run(&state, period, webdriver, auto, start).await,
        Command::Workspace { action } => commands::settings::workspace(&state, action),
        Command::Theme { set } => commands::settings::theme(&state, set),
        Command::Language { set } => commands::settings::language(&state, set),
    }
}

fn needs_workspace(command: &Command) -> bool {
    !matches!(
        command,
        Command::Workspace { .. } | Command::Theme { .. } | Command::Language { .. }
    )
}
