//! Style resolution
//!
//! Merges a template record, a named style preset and the user's explicit
//! overrides into one immutable [`StyleContext`]. Precedence, lowest first:
//! template defaults, preset, explicit settings.

use crate::manuscript::CustomSettings;
use crate::theme::{Palette, TemplateKind, TemplateStyle, FALLBACK_FONT};

/// Line spacing used when neither the preset nor the settings give one (1.6x)
pub const DEFAULT_LINE_SPACING: u32 = 384;

/// Line spacing units per single line
pub const SINGLE_LINE_SPACING: f64 = 240.0;

const DEFAULT_BODY_SIZE: u32 = 20;
const DEFAULT_H1_SIZE: u32 = 32;
const DEFAULT_H2_SIZE: u32 = 26;
const DEFAULT_H3_SIZE: u32 = 22;

/// Paragraph gap before and after, in twentieths of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub before: u32,
    pub after: u32,
}

impl Gap {
    pub const fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }
}

/// Paragraph gaps for each text role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gaps {
    pub h1: Gap,
    pub h2: Gap,
    pub h3: Gap,
    pub body: Gap,
    pub lead: Gap,
}

impl Gaps {
    /// Built-in gaps used without a preset
    fn for_kind(kind: TemplateKind) -> Self {
        let body = if kind == TemplateKind::Minimal {
            Gap::new(60, 80)
        } else {
            Gap::new(120, 160)
        };
        Self {
            h1: Gap::new(480, 120),
            h2: Gap::new(360, 100),
            h3: Gap::new(240, 80),
            body,
            lead: Gap::new(200, 200),
        }
    }
}

/// Named style presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StylePreset {
    /// Keep the template's own values
    #[default]
    Template,
    Classic,
    Modern,
    Report,
    Magazine,
}

/// Values a preset sets
#[derive(Debug, Clone, Copy, PartialEq)]
struct PresetMetrics {
    body_size: u32,
    h1_size: u32,
    h2_size: u32,
    h3_size: u32,
    line_spacing: u32,
    justify: bool,
    gaps: Gaps,
}

impl StylePreset {
    /// Parse a preset name; unknown names fall back to [`StylePreset::Template`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "classic" => StylePreset::Classic,
            "modern" => StylePreset::Modern,
            "report" => StylePreset::Report,
            "magazine" => StylePreset::Magazine,
            _ => StylePreset::Template,
        }
    }

    fn metrics(self) -> Option<PresetMetrics> {
        let metrics = match self {
            StylePreset::Template => return None,
            StylePreset::Classic => PresetMetrics {
                body_size: 21,
                h1_size: 34,
                h2_size: 28,
                h3_size: 24,
                line_spacing: 420,
                justify: true,
                gaps: Gaps {
                    h1: Gap::new(520, 140),
                    h2: Gap::new(380, 120),
                    h3: Gap::new(260, 90),
                    body: Gap::new(140, 180),
                    lead: Gap::new(210, 210),
                },
            },
            StylePreset::Modern => PresetMetrics {
                body_size: 20,
                h1_size: 32,
                h2_size: 26,
                h3_size: 22,
                line_spacing: 384,
                justify: false,
                gaps: Gaps {
                    h1: Gap::new(420, 110),
                    h2: Gap::new(300, 90),
                    h3: Gap::new(220, 70),
                    body: Gap::new(100, 150),
                    lead: Gap::new(170, 170),
                },
            },
            StylePreset::Report => PresetMetrics {
                body_size: 19,
                h1_size: 30,
                h2_size: 24,
                h3_size: 21,
                line_spacing: 360,
                justify: false,
                gaps: Gaps {
                    h1: Gap::new(360, 100),
                    h2: Gap::new(260, 80),
                    h3: Gap::new(200, 60),
                    body: Gap::new(90, 130),
                    lead: Gap::new(150, 150),
                },
            },
            StylePreset::Magazine => PresetMetrics {
                body_size: 21,
                h1_size: 36,
                h2_size: 30,
                h3_size: 24,
                line_spacing: 408,
                justify: true,
                gaps: Gaps {
                    h1: Gap::new(560, 150),
                    h2: Gap::new(420, 130),
                    h3: Gap::new(280, 100),
                    body: Gap::new(150, 200),
                    lead: Gap::new(240, 220),
                },
            },
        };
        Some(metrics)
    }
}

/// Page margin profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarginProfile {
    /// Derived from the template kind
    #[default]
    Template,
    Wide,
    Narrow,
}

impl MarginProfile {
    /// Parse a profile name; anything but `wide`/`narrow` is the template default
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "wide" => MarginProfile::Wide,
            "narrow" => MarginProfile::Narrow,
            _ => MarginProfile::Template,
        }
    }
}

/// Font sizes in half-points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSizes {
    pub body: u32,
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
}

/// Largest font size Word accepts, in half-points (1638 pt)
pub const MAX_FONT_SIZE: u32 = 3276;

/// Smallest usable body size in half-points
pub const MIN_BASE_SIZE: u32 = 2;

impl FontSizes {
    /// Heading sizes derived from a base body size
    ///
    /// The base is clamped so that the largest heading stays within
    /// [`MAX_FONT_SIZE`].
    pub fn from_base(base: u32) -> Self {
        let base = base.clamp(MIN_BASE_SIZE, MAX_FONT_SIZE - 8);
        Self {
            body: base,
            h1: base + 8,
            h2: base + 4,
            h3: base + 2,
        }
    }
}

/// Fully resolved visual configuration for one render
///
/// Built once per render by [`resolve`] and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleContext {
    /// Template display name
    pub name: String,
    /// Layout category
    pub kind: TemplateKind,
    pub body_font: String,
    pub heading_font: String,
    pub sizes: FontSizes,
    /// Line spacing where 240 is single spacing
    pub line_spacing: u32,
    pub justify: bool,
    pub gaps: Gaps,
    pub margins: MarginProfile,
    pub palette: Palette,
}

impl StyleContext {
    pub fn is_minimal(&self) -> bool {
        self.kind == TemplateKind::Minimal
    }

    pub fn is_editorial(&self) -> bool {
        self.kind == TemplateKind::Editorial
    }

    pub fn is_tech(&self) -> bool {
        self.kind == TemplateKind::Tech
    }
}

/// Resolve the effective style for one render
///
/// # Parameters
/// * `template` - The selected template record
/// * `settings` - User overrides; unset fields keep template/preset values
///
/// # Returns
/// * `StyleContext` - A complete style with every field defined
pub fn resolve(template: &TemplateStyle, settings: &CustomSettings) -> StyleContext {
    let preset = settings
        .style_preset
        .as_deref()
        .map(StylePreset::from_name)
        .unwrap_or_default();

    let mut sizes = FontSizes {
        body: DEFAULT_BODY_SIZE,
        h1: DEFAULT_H1_SIZE,
        h2: DEFAULT_H2_SIZE,
        h3: DEFAULT_H3_SIZE,
    };
    let mut line_spacing = DEFAULT_LINE_SPACING;
    let mut justify = false;
    let mut gaps = Gaps::for_kind(template.kind);

    if let Some(metrics) = preset.metrics() {
        sizes = FontSizes {
            body: metrics.body_size,
            h1: metrics.h1_size,
            h2: metrics.h2_size,
            h3: metrics.h3_size,
        };
        line_spacing = metrics.line_spacing;
        justify = metrics.justify;
        gaps = metrics.gaps;
    }

    let body_font = settings
        .b_font
        .clone()
        .or_else(|| non_empty(&template.font))
        .unwrap_or_else(|| FALLBACK_FONT.to_string());
    let heading_font = settings
        .h_font
        .clone()
        .or_else(|| template.heading_font.clone())
        .unwrap_or_else(|| body_font.clone());

    if let Some(base) = settings.base_size {
        sizes = FontSizes::from_base(base);
    }
    if let Some(multiplier) = settings.line_spacing {
        line_spacing = (multiplier * SINGLE_LINE_SPACING).round() as u32;
    }
    if let Some(flag) = settings.justify {
        justify = flag;
    }

    let margins = settings
        .margins
        .as_deref()
        .map(MarginProfile::from_name)
        .unwrap_or_default();

    log::debug!(
        "Resolved style '{}': preset {:?}, body {} / h1 {}, line spacing {}",
        template.name,
        preset,
        sizes.body,
        sizes.h1,
        line_spacing
    );

    StyleContext {
        name: template.name.clone(),
        kind: template.kind,
        body_font,
        heading_font,
        sizes,
        line_spacing,
        justify,
        gaps,
        margins,
        palette: template.palette.clone(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}
