//! # docstyle
//!
//! Renders manuscripts (an ordered list of typed content elements plus
//! metadata) into styled Word documents. Manuscripts are JSON, structured
//! Markdown ([`markdown_source`]) or existing Word files ([`docx_source`]).
//!
//! A build runs in stages:
//!
//! 1. [`style::resolve`] merges a template, a style preset and user overrides
//! 2. [`auto_polish`] decides whether the manuscript is text-heavy and, if so,
//!    splits long paragraphs and inserts lead paragraphs and section dividers
//! 3. [`renderer::render_element`] maps every element to blocks
//! 4. [`assembler::assemble`] adds cover, contents, header and footer
//! 5. [`docx_rs_exporter`] writes the document tree as a .docx package
//!
//! ## Quick Start
//!
//! ```no_run
//! use docstyle::{Manuscript, ThemeRegistry};
//! use std::path::Path;
//!
//! let manuscript = Manuscript::load("chapter.json").unwrap();
//! let registry = ThemeRegistry::bundled().unwrap();
//! let template = registry.get("25").unwrap();
//! let report = docstyle::build_to_file(&manuscript, template, Path::new("chapter.docx")).unwrap();
//! println!("{} elements, {} images", report.element_count, report.image_count);
//! ```

#![deny(unsafe_code)]

pub mod assembler;
pub mod auto_polish;
pub mod config;
pub mod document_tree;
pub mod docx_rs_exporter;
pub mod docx_source;
pub mod manuscript;
pub mod markdown_source;
pub mod pipeline;
pub mod renderer;
pub mod style;
pub mod theme;

pub use manuscript::{CustomSettings, DocumentMeta, Element, Manuscript};
pub use pipeline::{build, build_to_file, convert_json, BuildError, BuildOutput, BuildReport};
pub use theme::{TemplateStyle, ThemeRegistry};
