use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "api")]
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    #[serde(alias = "storage_path")]
    pub storage: Option<String>,
    pub placeholder_image: Option<String>,
    pub search_mode: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".disneycards"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

pub fn default_storage_path() -> PathBuf {
    app_dir()
        .map(|dir| dir.join("storage.json"))
        .unwrap_or_else(|| PathBuf::from("disneycards-storage.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# disneycards config
#
# Location (default):
#   ~/.disneycards/config.yml

# Catalog
api_url: https://api.disneyapi.dev
page_size: 50
timeout: 10
# proxy: http://127.0.0.1:8080

# Where favourites are kept between runs
storage: ~/.disneycards/storage.json

# Shown for characters without a picture
placeholder_image: https://via.placeholder.com/160x200/cfe2f3/351c75/?text=Disney

# Search results: "replace" the character list, or "swap" to a separate list
search_mode: replace

# Output (optional)
# output: ./characters.json
# output_format: text
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
