//! Command-line configuration loaded from `config.toml`.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use reportline_core::report::ATTENDANCE_PAGE_CAPACITY;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    template_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    attendance: Option<AttendanceFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttendanceFile {
    page_capacity: Option<usize>,
    filter_field: Option<String>,
    sort_field: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub attendance: AttendanceConfig,
}

/// Roster preparation and paging for attendance lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendanceConfig {
    pub page_capacity: usize,
    /// Only entities with this field set to `true` are listed.
    pub filter_field: String,
    /// Entities are ordered case-insensitively by this field.
    pub sort_field: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("."),
            attendance: AttendanceConfig::default(),
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        AttendanceConfig {
            page_capacity: ATTENDANCE_PAGE_CAPACITY,
            filter_field: "ec".to_string(),
            sort_field: "last_name".to_string(),
        }
    }
}

impl Config {
    /// Load `explicit`, or the user config file if it exists.
    ///
    /// A missing explicit file is an error; a missing user config file
    /// yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => match user_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Config::default()),
            },
        };

        let meta = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            bail!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            );
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Config::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Config> {
        let file: ConfigFile = toml::from_str(content)?;
        let defaults = Config::default();
        let attendance = file.attendance.unwrap_or_default();
        Ok(Config {
            template_dir: file.template_dir.unwrap_or(defaults.template_dir),
            output_dir: file.output_dir.unwrap_or(defaults.output_dir),
            attendance: AttendanceConfig {
                page_capacity: attendance
                    .page_capacity
                    .unwrap_or(defaults.attendance.page_capacity),
                filter_field: attendance
                    .filter_field
                    .unwrap_or(defaults.attendance.filter_field),
                sort_field: attendance
                    .sort_field
                    .unwrap_or(defaults.attendance.sort_field),
            },
        })
    }
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "reportline")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            "template_dir = \"/srv/templates\"\n[attendance]\npage_capacity = 3\n",
        )
        .unwrap();
        assert_eq!(config.template_dir, PathBuf::from("/srv/templates"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.attendance.page_capacity, 3);
        assert_eq!(config.attendance.filter_field, "ec");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(Config::from_toml("templates = \"x\"").is_err());
        assert!(Config::from_toml("[attendance]\ncapacity = 3").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output_dir = \"out\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let padding = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        std::fs::write(&path, padding).unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
