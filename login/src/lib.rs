mod auth_store;
mod token_data;

use std::path::PathBuf;

pub use auth_store::AUTH_FILE_NAME;
pub use auth_store::FileTokenStore;
pub use auth_store::MemoryTokenStore;
pub use auth_store::TokenStore;
pub use auth_store::get_auth_file;
pub use auth_store::try_read_auth_json;
pub use token_data::StoredAuth;
pub use token_data::TokenPair;

pub const TASKBOARD_HOME_ENV_VAR: &str = "TASKBOARD_HOME";

/// Returns the directory holding `auth.json` and `config.toml`.
///
/// `$TASKBOARD_HOME` wins when set and non-empty; otherwise `~/.taskboard`.
/// The directory is not required to exist.
pub fn find_taskboard_home() -> std::io::Result<PathBuf> {
    if let Ok(val) = std::env::var(TASKBOARD_HOME_ENV_VAR)
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }

    let mut home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    home.push(".taskboard");
    Ok(home)
}
