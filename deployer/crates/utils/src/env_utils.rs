use std::env::VarError;
use std::path::PathBuf;

pub fn get_env_var(key: &str) -> Result<String, VarError> {
    std::env::var(key)
}

pub fn get_env_var_optional(key: &str) -> Option<String> {
    match get_env_var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

pub fn get_env_var_or_default(key: &str, default: &str) -> String {
    get_env_var_optional(key).unwrap_or_else(|| default.to_string())
}

/// The current user's home directory, `HOME` on unix and `USERPROFILE` on windows.
pub fn home_dir() -> Option<PathBuf> {
    get_env_var_optional("HOME").or_else(|| get_env_var_optional("USERPROFILE")).map(PathBuf::from)
}
