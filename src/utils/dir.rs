use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

/// Where state lives for a platform, given a way to read environment variables. Windows uses
/// `%APPDATA%`, everything else the XDG state directory with `~/.local/state` as fallback.
fn state_dir(var: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    let mut path = if cfg!(windows) {
        var("APPDATA")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("APPDATA is not set"))?
    } else {
        match (var("XDG_STATE_HOME"), var("HOME")) {
            (Some(state), _) if !state.is_empty() => PathBuf::from(state),
            (_, Some(home)) => PathBuf::from(home).join(".local/state"),
            _ => return Err(anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME")),
        }
    };
    path.push(env!("CARGO_PKG_NAME"));
    Ok(path)
}

/// Directory for application state, currently only logs. Created if missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = state_dir(|name| env::var(name).ok())?;

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
