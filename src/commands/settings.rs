use anyhow::{anyhow, Result};
use console::style;

use crate::args::WorkspaceAction;
use crate::models::{Language, Theme};
use crate::services::state::{AppState, HostApi};

pub fn workspace(state: &AppState, action: Option<WorkspaceAction>) -> Result<()> {
    match action.unwrap_or(WorkspaceAction::Show) {
        WorkspaceAction::Show => match state.get_folder() {
            Some(folder) => println!("{}", folder.display()),
            None => println!("{}", style("(not set)").italic()),
        },
        WorkspaceAction::Set { folder } => {
            if !state.set_folder(&folder) {
                return Err(anyhow!("Could not use {} as workspace", folder.display()));
            }
            println!("{}", folder.display());
        }
        WorkspaceAction::Pick => match state.pick_folder() {
            Some(folder) => println!("{}", folder.display()),
            None => println!("{}", style("(unchanged)").italic()),
        },
    }
    Ok(())
}

pub fn theme(state: &AppState, set: Option<Theme>) -> Result<()> {
    if let Some(theme) = set {
        if !state.set_theme(theme) {
            return Err(anyhow!("Failed to save theme"));
        }
    }
    let theme = state.get_theme();
    match theme {
        Theme::System => println!("system ({:?})", state.get_system_theme()),
        other => println!("{:?}", other),
    }
    Ok(())
}

pub fn language(state: &AppState, set: Option<Language>) -> Result<()> {
    if let Some(language) = set {
        if !state.set_language(language) {
            return Err(anyhow!("Failed to save language"));
        }
    }
    println!("{}", state.get_language().code());
    Ok(())
}
