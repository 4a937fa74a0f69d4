use anyhow::anyhow;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Names an alternative settings file, e.g. for a second set of credentials.
pub const SETTINGS_ENV: &str = "PANW_SETTINGS";

/// Returns a [PathBuf] to the settings file shared by all of the tools.
///
/// This is the value of `PANW_SETTINGS` if it's set, or `.panw-settings.json` in the user's home
/// directory otherwise.
pub fn settings_path() -> anyhow::Result<PathBuf> {
    resolve_settings_path(env::var_os(SETTINGS_ENV), home::home_dir())
}

/// Returns a [PathBuf] to the private key used for key-based SSH authentication:
/// `~/.ssh/id_rsa`.
pub fn default_key_path() -> anyhow::Result<PathBuf> {
    let mut path = home_dir(home::home_dir())?;
    path.push(".ssh");
    path.push("id_rsa");
    Ok(path)
}

fn resolve_settings_path(
    overridden: Option<OsString>,
    home: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    // An empty variable counts as unset.
    if let Some(path) = overridden.filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let mut path = home_dir(home)?;
    path.push(".panw-settings.json");
    Ok(path)
}

fn home_dir(home: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    home.filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("unable to locate your home directory"))
}
