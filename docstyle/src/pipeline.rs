//! Build pipeline
//!
//! Orchestrates one render:
//! 1. **Style**: resolve the template and settings into a style context
//! 2. **Polish**: classify the element sequence and restructure it if eligible
//! 3. **Render**: map every element to blocks
//! 4. **Assemble**: wrap the blocks into a document tree
//!
//! The pipeline itself performs no output I/O; [`build_to_file`] hands the tree
//! to the docx backend.

use crate::assembler::{assemble, RenderedElement};
use crate::auto_polish::{classify, polish, Classification, PolishLevel};
use crate::config::ConfigError;
use crate::document_tree::DocumentTree;
use crate::docx_rs_exporter::{self, ExportError};
use crate::manuscript::{CustomSettings, Element, Manuscript, ManuscriptError};
use crate::renderer::{image_path, is_image_missing, render_element};
use crate::style::resolve;
use crate::theme::{TemplateStyle, ThemeError, ThemeRegistry};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Element sequence after the auto-polish stage
#[derive(Debug, Clone, PartialEq)]
pub struct PolishOutcome {
    pub level: PolishLevel,
    /// Classifier statistics; `None` when auto-polish is off
    pub classification: Option<Classification>,
    /// Whether the sequence was rewritten
    pub polished: bool,
    pub elements: Vec<Element>,
}

/// Summary of one build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub template: String,
    /// Elements rendered, after auto-polish
    pub element_count: usize,
    /// Pictures embedded in the document
    pub image_count: usize,
    pub polish: PolishSummary,
    /// Image files that were replaced by placeholders
    pub missing_images: Vec<PathBuf>,
}

/// Auto-polish part of a [`BuildReport`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolishSummary {
    pub level: PolishLevel,
    pub classification: Option<Classification>,
    pub polished: bool,
}

/// Result of [`build`]
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub tree: DocumentTree,
    pub report: BuildReport,
}

/// Stage 2: classify and, when eligible, restructure the element sequence
///
/// # Parameters
/// * `elements` - Manuscript elements in order
/// * `settings` - Effective settings (auto-polish switch and level)
///
/// # Returns
/// * `PolishOutcome` - The sequence to render plus the decision behind it
pub fn prepare_elements(elements: &[Element], settings: &CustomSettings) -> PolishOutcome {
    let level = PolishLevel::from_settings(settings);
    let Some(profile) = level.profile() else {
        log::debug!("Auto-polish is off");
        return PolishOutcome {
            level,
            classification: None,
            polished: false,
            elements: elements.to_vec(),
        };
    };

    let classification = classify(elements, &profile);
    log::debug!(
        "Auto-polish '{}': {} elements, text ratio {:.2}, heavy {}/{}, eligible: {}",
        level,
        classification.total,
        classification.text_ratio(),
        classification.heavy_count,
        classification.heavy_limit,
        classification.eligible
    );

    let (polished, elements) = if classification.eligible {
        let polished = polish(elements, &profile);
        log::info!(
            "Auto-polish '{}' applied: {} -> {} elements",
            level,
            elements.len(),
            polished.len()
        );
        (true, polished)
    } else {
        (false, elements.to_vec())
    };

    PolishOutcome {
        level,
        classification: Some(classification),
        polished,
        elements,
    }
}

/// Build the document tree for a manuscript
///
/// # Parameters
/// * `manuscript` - Decoded manuscript with its effective settings
/// * `template` - The selected template record
///
/// # Returns
/// * `BuildOutput` - The document tree and a report of what was done
pub fn build(manuscript: &Manuscript, template: &TemplateStyle) -> BuildOutput {
    log::info!(
        "Building '{}' with template '{}' ({} elements)",
        manuscript.meta.title,
        template.name,
        manuscript.elements.len()
    );

    let style = resolve(template, &manuscript.custom_settings);
    let outcome = prepare_elements(&manuscript.elements, &manuscript.custom_settings);
    let image_dir = manuscript.image_dir();

    let missing_images: Vec<PathBuf> = outcome
        .elements
        .iter()
        .filter_map(|element| match element {
            Element::Image { filename, .. } if is_image_missing(&image_dir, filename) => {
                Some(image_path(&image_dir, filename))
            }
            _ => None,
        })
        .collect();

    let rendered: Vec<RenderedElement> = outcome
        .elements
        .iter()
        .map(|element| RenderedElement {
            kind: element.kind(),
            blocks: render_element(element, &style, &image_dir),
        })
        .collect();

    let tree = assemble(&style, &manuscript.meta, rendered);

    let report = BuildReport {
        template: template.name.clone(),
        element_count: outcome.elements.len(),
        image_count: tree.image_count(),
        polish: PolishSummary {
            level: outcome.level,
            classification: outcome.classification,
            polished: outcome.polished,
        },
        missing_images,
    };

    BuildOutput { tree, report }
}

/// Build a manuscript and write it as a .docx file
///
/// # Parameters
/// * `manuscript` - Decoded manuscript with its effective settings
/// * `template` - The selected template record
/// * `output_path` - Where the .docx file is written
///
/// # Returns
/// * `Ok(BuildReport)` - The file was written
/// * `Err(BuildError)` - The backend failed to write the file
pub fn build_to_file(
    manuscript: &Manuscript,
    template: &TemplateStyle,
    output_path: &Path,
) -> Result<BuildReport, BuildError> {
    let output = build(manuscript, template);
    docx_rs_exporter::to_docx(&output.tree, output_path)?;
    Ok(output.report)
}

/// Decode a JSON manuscript, look up its template and write the document
///
/// This is the whole conversion a service performs per request; failures the
/// caller caused report [`BuildError::is_invalid_input`].
pub fn convert_json(
    json: &str,
    registry: &ThemeRegistry,
    template_id: &str,
    output_path: &Path,
) -> Result<BuildReport, BuildError> {
    let manuscript = Manuscript::from_json(json)?;
    let template = registry.get(template_id)?;
    build_to_file(&manuscript, template, output_path)
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Manuscript error: {0}")]
    Manuscript(#[from] ManuscriptError),

    #[error("Template error: {0}")]
    Theme(#[from] ThemeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl BuildError {
    /// Whether the caller supplied bad input (unreadable or malformed
    /// manuscript, unknown template) rather than the build itself failing
    pub fn is_invalid_input(&self) -> bool {
        match self {
            BuildError::Manuscript(_) => true,
            BuildError::Theme(ThemeError::UnknownTemplate { .. }) => true,
            BuildError::Theme(_) => false,
            BuildError::Config(_) => true,
            BuildError::Export(_) => false,
        }
    }
}
