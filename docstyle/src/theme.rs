//! Template registry
//!
//! Every template is one [`TemplateStyle`] record: a colour palette, a font and
//! a layout category. The bundled records live in `templates/themes.toml` and
//! are compiled into the binary; a different table can be loaded from disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Embedded theme table
const BUNDLED_THEMES: &str = include_str!("templates/themes.toml");

/// Template used when none is requested
pub const DEFAULT_TEMPLATE_ID: &str = "01";

/// Font used when neither the template nor the settings name one
pub const FALLBACK_FONT: &str = "Arial";

/// Layout category of a template
///
/// The category changes rendering behaviour, not only colours: minimal themes
/// centre and space out their content, tech themes draw insights as terminal
/// boxes, and editorial themes switch the body to two columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Editorial,
    Minimal,
    Tech,
    Business,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateKind::Editorial => "editorial",
            TemplateKind::Minimal => "minimal",
            TemplateKind::Tech => "tech",
            TemplateKind::Business => "business",
        };
        f.write_str(name)
    }
}

/// Semantic colours of a template, as RRGGBB hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Chapter band, Q&A and prompt headers, table header row
    pub bg_head: String,
    /// Q&A answer box
    pub bg_box: String,
    /// Insight box, table label column
    pub bg_red: String,
    /// Tip box
    pub bg_green: String,
    /// Warning box
    pub bg_amber: String,
    pub white: String,
    /// Body text
    pub text: String,
    /// Titles
    pub dark: String,
    pub gray: String,
    /// Captions
    pub gray2: String,
    /// Subtitles and header text
    pub gray3: String,
    pub accent: String,
    pub blue: String,
    pub blue2: String,
    pub box_border: String,
    pub green: String,
    pub amber: String,
    /// Rules and borders
    pub rule: String,
}

impl Default for Palette {
    /// The Classic Editorial palette
    fn default() -> Self {
        Self {
            bg_head: "1E293B".to_string(),
            bg_box: "EFF6FF".to_string(),
            bg_red: "FEF2F2".to_string(),
            bg_green: "F0FDF4".to_string(),
            bg_amber: "FFFBEB".to_string(),
            white: "FFFFFF".to_string(),
            text: "1E293B".to_string(),
            dark: "1E293B".to_string(),
            gray: "374151".to_string(),
            gray2: "6B7280".to_string(),
            gray3: "9CA3AF".to_string(),
            accent: "DC2626".to_string(),
            blue: "1D4ED8".to_string(),
            blue2: "3B82F6".to_string(),
            box_border: "93C5FD".to_string(),
            green: "047857".to_string(),
            amber: "B45309".to_string(),
            rule: "E5E7EB".to_string(),
        }
    }
}

/// One template record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStyle {
    /// Display name
    pub name: String,

    /// Layout category
    #[serde(default)]
    pub kind: TemplateKind,

    /// Short audience tag
    #[serde(default)]
    pub tag: String,

    /// One-line description
    #[serde(default)]
    pub description: String,

    /// Body font
    #[serde(default = "default_font")]
    pub font: String,

    /// Heading font; the body font is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_font: Option<String>,

    /// Colours
    #[serde(default)]
    pub palette: Palette,
}

fn default_font() -> String {
    FALLBACK_FONT.to_string()
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self {
            name: "Classic Editorial".to_string(),
            kind: TemplateKind::Editorial,
            tag: String::new(),
            description: String::new(),
            font: default_font(),
            heading_font: None,
            palette: Palette::default(),
        }
    }
}

/// On-disk shape of a theme table
#[derive(Debug, Deserialize)]
struct ThemeFile {
    themes: BTreeMap<String, TemplateStyle>,
}

/// Templates keyed by two-digit id
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, TemplateStyle>,
}

impl ThemeRegistry {
    /// Registry of the themes compiled into the binary
    pub fn bundled() -> Result<Self, ThemeError> {
        Self::from_toml(BUNDLED_THEMES).map_err(|e| ThemeError::Parse(PathBuf::from("<bundled>"), e))
    }

    /// Load a theme table from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to a TOML file with a `[themes."NN"]` table per template
    ///
    /// # Returns
    /// * `Ok(ThemeRegistry)` - Successfully loaded registry
    /// * `Err(ThemeError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ThemeError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&content).map_err(|e| ThemeError::Parse(path.to_path_buf(), e))
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ThemeFile = toml::from_str(content)?;
        let themes = file
            .themes
            .into_iter()
            .map(|(id, style)| (normalize_id(&id), style))
            .collect();
        Ok(Self { themes })
    }

    /// Look up a template by id (`"1"`, `"01"` and `"001"` are the same)
    pub fn get(&self, id: &str) -> Result<&TemplateStyle, ThemeError> {
        let key = normalize_id(id);
        self.themes.get(&key).ok_or_else(|| ThemeError::UnknownTemplate {
            id: id.to_string(),
            available: self.ids().join(", "),
        })
    }

    /// All template ids in ascending order
    pub fn ids(&self) -> Vec<String> {
        self.themes.keys().cloned().collect()
    }

    /// Iterate over `(id, template)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateStyle)> {
        self.themes.iter().map(|(id, style)| (id.as_str(), style))
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    /// Whether the registry holds no templates
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

/// Normalise a template id: strip leading zeros, then pad to two digits
pub fn normalize_id(id: &str) -> String {
    let trimmed = id.trim().trim_start_matches('0');
    format!("{:0>2}", trimmed)
}

/// Errors that can occur when loading or querying templates
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Theme file {path} is malformed: {source}", path = .0.display(), source = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Template '{id}' not found (available: {available})")]
    UnknownTemplate { id: String, available: String },
}
