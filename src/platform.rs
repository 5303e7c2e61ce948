use std::path::PathBuf;

const APP_NAME: &str = "timeturner";
const DATABASE_FILE: &str = "timeturner.sqlite";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// ~/.local/share/timeturner/timeturner.sqlite or the platform equivalent,
/// falling back to the working directory when no home is known.
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

/// ~/.config/timeturner/config.toml or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
