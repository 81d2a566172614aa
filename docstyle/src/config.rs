//! Tool configuration from docstyle.toml

use crate::manuscript::CustomSettings;
use crate::theme::DEFAULT_TEMPLATE_ID;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no path is given
pub const CONFIG_FILE_NAME: &str = "docstyle.toml";

/// Defaults applied to every build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Template id used when the command line names none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Theme table replacing the bundled one; relative to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes_path: Option<PathBuf>,

    /// Image directory for manuscripts that do not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base_dir: Option<PathBuf>,

    /// Lowest-precedence style settings
    pub settings: CustomSettings,

    /// Directory of the file this was loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl ToolConfig {
    /// Load configuration from a docstyle.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ToolConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config: ToolConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load the given file, or `./docstyle.toml` if it exists, or defaults
    ///
    /// An explicitly named file must exist; the implicit one is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let implicit = Path::new(CONFIG_FILE_NAME);
                if implicit.is_file() {
                    log::info!("Using configuration {}", implicit.display());
                    Self::load(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
    }

    /// Starting point written by `docstyle init`
    pub fn starter(template: Option<&str>) -> Self {
        Self {
            template: Some(template.unwrap_or(DEFAULT_TEMPLATE_ID).to_string()),
            image_base_dir: Some(PathBuf::from("images")),
            settings: CustomSettings {
                style_preset: Some("template".to_string()),
                auto_polish: Some(true),
                auto_polish_level: Some("normal".to_string()),
                margins: Some("default".to_string()),
                ..CustomSettings::default()
            },
            ..Self::default()
        }
    }

    /// Write this configuration as `docstyle.toml` inside `dir`
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_into(&self, dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(dir).map_err(|e| ConfigError::Io(dir.to_path_buf(), e))?;
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path));
        }
        self.save(&path)?;
        Ok(path)
    }

    /// Theme table path resolved against the config file's directory
    pub fn themes_path(&self) -> Option<PathBuf> {
        self.themes_path.as_ref().map(|p| self.resolve(p))
    }

    /// Image directory resolved against the config file's directory
    pub fn image_base_dir(&self) -> Option<PathBuf> {
        self.image_base_dir.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Errors that can occur when loading or saving tool configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("TOML parse error in {path}: {source}", path = .0.display(), source = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("{path} already exists (use --force to overwrite)", path = .0.display())]
    AlreadyExists(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
template = "25"
themes_path = "themes/custom.toml"

[settings]
style_preset = "report"
base_size = 22
justify = "true"
auto_polish_level = "strong"
"#;

        let config: ToolConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.template.as_deref(), Some("25"));
        assert_eq!(config.settings.style_preset.as_deref(), Some("report"));
        assert_eq!(config.settings.base_size, Some(22));
        assert_eq!(config.settings.justify, Some(true));
        assert_eq!(config.settings.auto_polish_level.as_deref(), Some("strong"));
        assert_eq!(config.image_base_dir, None);
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = std::env::temp_dir().join("docstyle-config-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "themes_path = \"themes.toml\"\nimage_base_dir = \"/abs/images\"\n",
        )
        .unwrap();

        let config = ToolConfig::load(&path).unwrap();

        assert_eq!(config.themes_path(), Some(dir.join("themes.toml")));
        assert_eq!(config.image_base_dir(), Some(PathBuf::from("/abs/images")));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join("docstyle-config-save.toml");
        let config = ToolConfig {
            template: Some("02".to_string()),
            settings: CustomSettings {
                margins: Some("narrow".to_string()),
                ..CustomSettings::default()
            },
            ..ToolConfig::default()
        };

        config.save(&path).unwrap();
        let reloaded = ToolConfig::load(&path).unwrap();

        assert_eq!(reloaded.template, config.template);
        assert_eq!(reloaded.settings, config.settings);
    }

    #[test]
    fn test_starter_config_is_written_once() {
        let dir = std::env::temp_dir().join("docstyle-config-init");
        let _ = fs::remove_dir_all(&dir);

        let path = ToolConfig::starter(Some("25")).write_into(&dir, false).unwrap();
        assert_eq!(path, dir.join(CONFIG_FILE_NAME));

        let written = ToolConfig::load(&path).unwrap();
        assert_eq!(written.template.as_deref(), Some("25"));
        assert_eq!(written.settings.auto_polish, Some(true));
        assert_eq!(written.image_base_dir(), Some(dir.join("images")));

        assert!(matches!(
            ToolConfig::starter(None).write_into(&dir, false),
            Err(ConfigError::AlreadyExists(_))
        ));
        ToolConfig::starter(None).write_into(&dir, true).unwrap();
        let replaced = ToolConfig::load(&path).unwrap();
        assert_eq!(replaced.template.as_deref(), Some(DEFAULT_TEMPLATE_ID));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let missing = Path::new("/nonexistent/docstyle.toml");
        assert!(matches!(
            ToolConfig::discover(Some(missing)),
            Err(ConfigError::Io(_, _))
        ));
    }
}
