//! Manuscript input model
//!
//! A manuscript is the JSON document handed to the builder: document metadata,
//! user-facing style settings, the image directory and an ordered list of typed
//! content elements. Decoding is deliberately forgiving: missing or malformed
//! optional fields fall back to empty values, and numbers may be given as
//! strings (the front ends send `"20"` as often as `20`).

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Image directory used when the manuscript does not name one
pub const DEFAULT_IMAGE_BASE_DIR: &str = "./temp/images/";

/// A complete manuscript ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manuscript {
    /// Document metadata (cover, header, footer)
    pub meta: DocumentMeta,

    /// User overrides for the selected template
    pub custom_settings: CustomSettings,

    /// Directory that image file names are resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base_dir: Option<PathBuf>,

    /// Ordered content elements
    pub elements: Vec<Element>,
}

impl Manuscript {
    /// Parse a manuscript from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ManuscriptError> {
        serde_json::from_str(json).map_err(ManuscriptError::Json)
    }

    /// Load a manuscript from a `.json`, structured `.md` or `.docx` file
    ///
    /// Pictures in a `.docx` file are extracted to
    /// [`docx_source::media_dir`](crate::docx_source::media_dir).
    ///
    /// # Parameters
    /// * `path` - Path to the manuscript file
    ///
    /// # Returns
    /// * `Ok(Manuscript)` - Successfully decoded manuscript
    /// * `Err(ManuscriptError)` - The file could not be read or is not a manuscript
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManuscriptError> {
        let path = path.as_ref();

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        if extension == "docx" {
            let bytes =
                std::fs::read(path).map_err(|e| ManuscriptError::Io(path.to_path_buf(), e))?;
            let media_dir = crate::docx_source::media_dir(path);
            return crate::docx_source::load(&bytes, &media_dir)
                .map_err(|e| ManuscriptError::Docx(path.to_path_buf(), e));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ManuscriptError::Io(path.to_path_buf(), e))?;

        match extension.as_str() {
            "md" | "markdown" => {
                let mut manuscript = crate::markdown_source::parse(&content);
                if manuscript.image_base_dir.is_none() {
                    manuscript.image_base_dir = path.parent().map(Path::to_path_buf);
                }
                Ok(manuscript)
            }
            _ => Self::from_json(&content),
        }
    }

    /// Write the manuscript as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ManuscriptError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(ManuscriptError::Json)?;
        std::fs::write(path, content).map_err(|e| ManuscriptError::Io(path.to_path_buf(), e))
    }

    /// Directory image file names are resolved against
    pub fn image_dir(&self) -> PathBuf {
        self.image_base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_BASE_DIR))
    }
}

/// Document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMeta {
    /// Document title (cover and header)
    pub title: String,
    /// Cover subtitle
    pub subtitle: String,
    /// Author (cover and copyright line)
    pub author: String,
    /// Chapter name shown on the right of the header
    pub chapter: String,
    /// Replaces the title/chapter pair in the header when non-empty
    pub header_text: String,
    /// Page numbers in the footer; absent means enabled
    #[serde(deserialize_with = "lenient_opt_bool")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_numbers: Option<bool>,
    /// Table of contents after the cover
    #[serde(deserialize_with = "lenient_bool")]
    pub auto_toc: bool,
}

impl DocumentMeta {
    /// Whether the footer shows page numbers
    pub fn show_page_numbers(&self) -> bool {
        self.page_numbers != Some(false)
    }

    /// Whether any cover field is present
    pub fn has_cover(&self) -> bool {
        !self.title.is_empty() || !self.subtitle.is_empty() || !self.author.is_empty()
    }
}

/// User-facing overrides applied on top of a template
///
/// Every field is optional; `None` means "use the template / preset value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSettings {
    /// Named style preset (template, classic, modern, report, magazine)
    #[serde(deserialize_with = "lenient_opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<String>,

    /// Auto-polish switch; absent means enabled
    #[serde(deserialize_with = "lenient_opt_bool")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_polish: Option<bool>,

    /// Auto-polish level (off, weak, normal, strong)
    #[serde(deserialize_with = "lenient_opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_polish_level: Option<String>,

    /// Heading font family
    #[serde(deserialize_with = "lenient_opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_font: Option<String>,

    /// Body font family
    #[serde(deserialize_with = "lenient_opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_font: Option<String>,

    /// Body size in half-points; headings derive from it
    #[serde(deserialize_with = "lenient_opt_u32")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_size: Option<u32>,

    /// Line spacing multiplier (1.0 = single)
    #[serde(deserialize_with = "lenient_opt_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,

    /// Justify body text
    #[serde(deserialize_with = "lenient_opt_bool")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify: Option<bool>,

    /// Margin profile name (default, wide, narrow)
    #[serde(deserialize_with = "lenient_opt_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<String>,
}

impl CustomSettings {
    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn overlay(self, other: CustomSettings) -> CustomSettings {
        CustomSettings {
            style_preset: other.style_preset.or(self.style_preset),
            auto_polish: other.auto_polish.or(self.auto_polish),
            auto_polish_level: other.auto_polish_level.or(self.auto_polish_level),
            h_font: other.h_font.or(self.h_font),
            b_font: other.b_font.or(self.b_font),
            base_size: other.base_size.or(self.base_size),
            line_spacing: other.line_spacing.or(self.line_spacing),
            justify: other.justify.or(self.justify),
            margins: other.margins.or(self.margins),
        }
    }
}

/// One manuscript content unit
///
/// Decoded from a JSON object with a `type` field. Kinds the renderer does not
/// know are kept as [`Element::Unknown`] so they can degrade to body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawElement", into = "RawElement")]
pub enum Element {
    /// Chapter opener band
    ChapterTitle {
        phase: String,
        text: String,
        sub: String,
    },
    /// Heading level 1-3; `num` is only shown on level 1
    Heading { level: u8, num: String, text: String },
    /// Body paragraph with an optional left indent (twips)
    Body { text: String, indent: u32 },
    /// Emphasised first paragraph after a heading
    Lead { text: String },
    Quote { text: String },
    Insight { text: String },
    Tip { text: String },
    Warning { text: String },
    Qa { question: String, answers: Vec<String> },
    Prompt { label: String, text: String },
    Conclusion { lines: Vec<String> },
    Bullets { items: Vec<String> },
    Image {
        filename: String,
        width_emu: u64,
        height_emu: u64,
        caption: String,
    },
    ImagePlaceholder { caption: String },
    Table2 {
        col1: String,
        col2: String,
        rows: Vec<Vec<String>>,
    },
    Table3 {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Horizontal rule with border size in eighths of a point
    Hr { size: u32 },
    SectionDivider { text: String },
    Empty { height: u32 },
    Unknown { kind: String, text: Option<String> },
}

/// Element kind without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    ChapterTitle,
    H1,
    H2,
    H3,
    Body,
    Lead,
    Quote,
    Insight,
    Tip,
    Warning,
    Qa,
    Prompt,
    Conclusion,
    Bullets,
    Image,
    ImagePlaceholder,
    Table2,
    Table3,
    Hr,
    SectionDivider,
    Empty,
    Unknown,
}

impl Element {
    /// Body paragraph without indent
    pub fn body(text: impl Into<String>) -> Self {
        Element::Body {
            text: text.into(),
            indent: 0,
        }
    }

    /// Heading of the given level
    pub fn heading(level: u8, num: impl Into<String>, text: impl Into<String>) -> Self {
        Element::Heading {
            level: level.clamp(1, 3),
            num: num.into(),
            text: text.into(),
        }
    }

    /// Payload-free kind of this element
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::ChapterTitle { .. } => ElementKind::ChapterTitle,
            Element::Heading { level: 1, .. } => ElementKind::H1,
            Element::Heading { level: 2, .. } => ElementKind::H2,
            Element::Heading { .. } => ElementKind::H3,
            Element::Body { .. } => ElementKind::Body,
            Element::Lead { .. } => ElementKind::Lead,
            Element::Quote { .. } => ElementKind::Quote,
            Element::Insight { .. } => ElementKind::Insight,
            Element::Tip { .. } => ElementKind::Tip,
            Element::Warning { .. } => ElementKind::Warning,
            Element::Qa { .. } => ElementKind::Qa,
            Element::Prompt { .. } => ElementKind::Prompt,
            Element::Conclusion { .. } => ElementKind::Conclusion,
            Element::Bullets { .. } => ElementKind::Bullets,
            Element::Image { .. } => ElementKind::Image,
            Element::ImagePlaceholder { .. } => ElementKind::ImagePlaceholder,
            Element::Table2 { .. } => ElementKind::Table2,
            Element::Table3 { .. } => ElementKind::Table3,
            Element::Hr { .. } => ElementKind::Hr,
            Element::SectionDivider { .. } => ElementKind::SectionDivider,
            Element::Empty { .. } => ElementKind::Empty,
            Element::Unknown { .. } => ElementKind::Unknown,
        }
    }

    /// The wire name used in the `type` field
    pub fn type_name(&self) -> &str {
        match self {
            Element::Unknown { kind, .. } => kind,
            other => other.kind().type_name(),
        }
    }
}

impl ElementKind {
    /// The wire name used in the `type` field
    pub fn type_name(self) -> &'static str {
        match self {
            ElementKind::ChapterTitle => "chapter_title",
            ElementKind::H1 => "h1",
            ElementKind::H2 => "h2",
            ElementKind::H3 => "h3",
            ElementKind::Body => "body",
            ElementKind::Lead => "lead",
            ElementKind::Quote => "quote",
            ElementKind::Insight => "insight",
            ElementKind::Tip => "tip",
            ElementKind::Warning => "warning",
            ElementKind::Qa => "qa",
            ElementKind::Prompt => "prompt",
            ElementKind::Conclusion => "conclusion",
            ElementKind::Bullets => "bullets",
            ElementKind::Image => "image",
            ElementKind::ImagePlaceholder => "image_placeholder",
            ElementKind::Table2 => "table2",
            ElementKind::Table3 => "table3",
            ElementKind::Hr => "hr",
            ElementKind::SectionDivider => "section_divider",
            ElementKind::Empty => "empty",
            ElementKind::Unknown => "unknown",
        }
    }
}

/// Flat wire form of an element: every field any kind may carry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawElement {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    kind: String,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    num: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    phase: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    answers: Vec<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    lines: Vec<String>,
    #[serde(deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    items: Vec<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    width_emu: Option<u64>,
    #[serde(deserialize_with = "lenient_opt_u64", skip_serializing_if = "Option::is_none")]
    height_emu: Option<u64>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    col1: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    col2: Option<String>,
    #[serde(deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    headers: Vec<String>,
    #[serde(deserialize_with = "lenient_rows", skip_serializing_if = "Vec::is_empty")]
    rows: Vec<Vec<String>>,
    #[serde(deserialize_with = "lenient_opt_u32", skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(deserialize_with = "lenient_opt_u32", skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(deserialize_with = "lenient_opt_u32", skip_serializing_if = "Option::is_none")]
    indent: Option<u32>,
}

impl From<RawElement> for Element {
    fn from(raw: RawElement) -> Self {
        let text = raw.text.clone().unwrap_or_default();
        match raw.kind.as_str() {
            "chapter_title" => Element::ChapterTitle {
                phase: raw.phase.unwrap_or_default(),
                text,
                sub: raw.sub.unwrap_or_default(),
            },
            "h1" => Element::heading(1, raw.num.unwrap_or_default(), text),
            "h2" => Element::heading(2, raw.num.unwrap_or_default(), text),
            "h3" => Element::heading(3, raw.num.unwrap_or_default(), text),
            "body" => Element::Body {
                text,
                indent: raw.indent.unwrap_or(0),
            },
            "lead" => Element::Lead { text },
            "quote" => Element::Quote { text },
            "insight" => Element::Insight { text },
            "tip" => Element::Tip { text },
            "warning" => Element::Warning { text },
            "qa" => Element::Qa {
                question: raw.question.unwrap_or_default(),
                answers: raw.answers,
            },
            "prompt" => Element::Prompt {
                label: raw.label.unwrap_or_default(),
                text,
            },
            "conclusion" => Element::Conclusion { lines: raw.lines },
            "bullets" => Element::Bullets { items: raw.items },
            "image" => Element::Image {
                filename: raw.filename.unwrap_or_default(),
                width_emu: raw.width_emu.unwrap_or(0),
                height_emu: raw.height_emu.unwrap_or(0),
                caption: raw.caption.unwrap_or_default(),
            },
            // Parsers that gave up on an image put the caption in `text`
            "image_placeholder" => Element::ImagePlaceholder {
                caption: raw.caption.or(raw.text).unwrap_or_default(),
            },
            "table2" => Element::Table2 {
                col1: raw.col1.unwrap_or_default(),
                col2: raw.col2.unwrap_or_default(),
                rows: raw.rows,
            },
            "table3" => Element::Table3 {
                headers: raw.headers,
                rows: raw.rows,
            },
            "hr" => Element::Hr {
                size: raw.size.unwrap_or(4),
            },
            "section_divider" => Element::SectionDivider { text },
            "empty" => Element::Empty {
                height: raw.height.unwrap_or(120),
            },
            _ => Element::Unknown {
                kind: raw.kind.clone(),
                text: raw.text.filter(|t| !t.is_empty()),
            },
        }
    }
}

impl From<Element> for RawElement {
    fn from(element: Element) -> Self {
        let mut raw = RawElement {
            kind: element.type_name().to_string(),
            ..Default::default()
        };
        match element {
            Element::ChapterTitle { phase, text, sub } => {
                raw.phase = Some(phase);
                raw.text = Some(text);
                raw.sub = Some(sub);
            }
            Element::Heading { num, text, level } => {
                if level == 1 {
                    raw.num = Some(num);
                }
                raw.text = Some(text);
            }
            Element::Body { text, indent } => {
                raw.text = Some(text);
                raw.indent = (indent > 0).then_some(indent);
            }
            Element::Lead { text }
            | Element::Quote { text }
            | Element::Insight { text }
            | Element::Tip { text }
            | Element::Warning { text }
            | Element::SectionDivider { text } => raw.text = Some(text),
            Element::Qa { question, answers } => {
                raw.question = Some(question);
                raw.answers = answers;
            }
            Element::Prompt { label, text } => {
                raw.label = Some(label);
                raw.text = Some(text);
            }
            Element::Conclusion { lines } => raw.lines = lines,
            Element::Bullets { items } => raw.items = items,
            Element::Image {
                filename,
                width_emu,
                height_emu,
                caption,
            } => {
                raw.filename = Some(filename);
                raw.width_emu = (width_emu > 0).then_some(width_emu);
                raw.height_emu = (height_emu > 0).then_some(height_emu);
                raw.caption = Some(caption);
            }
            Element::ImagePlaceholder { caption } => raw.caption = Some(caption),
            Element::Table2 { col1, col2, rows } => {
                raw.col1 = Some(col1);
                raw.col2 = Some(col2);
                raw.rows = rows;
            }
            Element::Table3 { headers, rows } => {
                raw.headers = headers;
                raw.rows = rows;
            }
            Element::Hr { size } => raw.size = Some(size),
            Element::Empty { height } => raw.height = Some(height),
            Element::Unknown { text, .. } => raw.text = text,
        }
        raw
    }
}

/// Render any JSON scalar as text; null and containers become `None`
fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

/// Empty and whitespace-only strings count as absent
fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).filter(|s| !s.trim().is_empty()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient_opt_bool(deserializer)?.unwrap_or(false))
}

fn lenient_opt_bool<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|f| f.is_finite() && *f > 0.0))
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
        }
        _ => None,
    })
}

/// Out-of-range values are treated like unparseable ones
fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let parsed = lenient_opt_u64(deserializer)?;
    Ok(parsed.and_then(|v| u32::try_from(v).ok()))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(values) => values
            .into_iter()
            .map(|v| scalar_to_string(v).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_rows<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Vec<String>>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| match row {
                serde_json::Value::Array(cells) => Some(
                    cells
                        .into_iter()
                        .map(|c| scalar_to_string(c).unwrap_or_default())
                        .collect(),
                ),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Errors that can occur when loading or saving a manuscript
#[derive(Error, Debug)]
pub enum ManuscriptError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid manuscript JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Unreadable Word document {path}: {source}", path = .0.display(), source = .1)]
    Docx(PathBuf, #[source] crate::docx_source::DocxSourceError),
}
