//! Word documents as manuscripts
//!
//! Reads a `.docx` package and classifies every body paragraph into a
//! manuscript element. A paragraph is tried against, in order:
//!
//! 1. an embedded picture (image, or placeholder when the file is missing)
//! 2. the `DS-*` paragraph styles of the DocStyle Word template
//! 3. the built-in `Heading 1`-`Heading 3` styles
//! 4. list styles and numbered paragraphs (bullets)
//! 5. its largest font size (28/24/20 pt for h1/h2/h3)
//! 6. all runs bold and at most 60 characters (h3)
//! 7. a left indent of at least half an inch (quote)
//!
//! Anything else is body text. Empty paragraphs are dropped. Afterwards
//! consecutive bullet and conclusion paragraphs are merged, `DS-QA-Answer`
//! paragraphs join the preceding question, a `DS-Caption` right after a
//! picture becomes its caption and a `Label:` body paragraph right before an
//! unlabelled `DS-Prompt` becomes the prompt label.

use crate::manuscript::{DocumentMeta, Element, Manuscript};
use itertools::Itertools;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
const MEDIA_PREFIX: &str = "word/media/";

/// Smallest font sizes (half-points) read as h1, h2 and h3
const H1_MIN_SIZE: u32 = 56;
const H2_MIN_SIZE: u32 = 48;
const H3_MIN_SIZE: u32 = 40;

/// Longest all-bold paragraph still read as a heading
const BOLD_HEADING_MAX_CHARS: usize = 60;

/// Left indent in twips from which plain text reads as a quote
const QUOTE_MIN_INDENT: i64 = 720;

/// `Label: text` in a single prompt paragraph
static PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.{1,30})[:：]\s*(.+)$").unwrap());

/// A paragraph holding only `Label:`
static LABEL_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.{1,30})[:：]\s*$").unwrap());

/// Parse a .docx package and extract its pictures into `media_dir`
///
/// The manuscript's image directory is set to `media_dir`.
pub fn load(bytes: &[u8], media_dir: &Path) -> Result<Manuscript, DocxSourceError> {
    let package = Package::read(bytes)?;
    let mut manuscript = package.manuscript()?;

    let extracted = package.extract_media(media_dir)?;
    if extracted > 0 {
        log::info!("Extracted {} image(s) to {}", extracted, media_dir.display());
    }
    manuscript.image_base_dir = Some(media_dir.to_path_buf());

    Ok(manuscript)
}

/// Parse a .docx package without touching the file system
pub fn parse(bytes: &[u8]) -> Result<Manuscript, DocxSourceError> {
    Package::read(bytes)?.manuscript()
}

/// Directory pictures of the given .docx file are extracted to
pub fn media_dir(docx_path: &Path) -> PathBuf {
    let stem = docx_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    std::env::temp_dir().join("docstyle-media").join(stem)
}

/// Errors that can occur when reading a Word document
#[derive(Error, Debug)]
pub enum DocxSourceError {
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML parsing error in {part}: {source}")]
    Xml {
        part: &'static str,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Required part not found: {0}")]
    MissingPart(&'static str),

    #[error("IO error writing {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),
}

/// Every part of the package, keyed by its path inside the archive
struct Package {
    parts: HashMap<String, Vec<u8>>,
}

impl Package {
    fn read(bytes: &[u8]) -> Result<Self, DocxSourceError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|e| DocxSourceError::Archive(e.into()))?;
            parts.insert(name, contents);
        }

        Ok(Self { parts })
    }

    fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// `(file name, contents)` of every picture under word/media
    fn media(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().filter_map(|(name, contents)| {
            name.strip_prefix(MEDIA_PREFIX)
                .filter(|file| !file.is_empty() && !file.contains('/'))
                .map(|file| (file, contents.as_slice()))
        })
    }

    fn manuscript(&self) -> Result<Manuscript, DocxSourceError> {
        let document = self
            .part(DOCUMENT_PART)
            .ok_or(DocxSourceError::MissingPart(DOCUMENT_PART))?;

        let context = Context {
            style_names: self
                .part(STYLES_PART)
                .map(parse_style_names)
                .transpose()?
                .unwrap_or_default(),
            image_targets: self
                .part(DOCUMENT_RELS_PART)
                .map(parse_image_targets)
                .transpose()?
                .unwrap_or_default(),
            media: self.media().map(|(name, _)| name.to_string()).collect(),
        };

        let mut sink = ElementSink::default();
        for block in parse_body(document)? {
            match block {
                RawBlock::Paragraph(para) => {
                    if let Some(item) = classify_paragraph(para, &context) {
                        sink.push(item);
                    }
                }
                RawBlock::Table(rows) => sink.push(Classified::Element(classify_table(rows))),
            }
        }
        let elements = sink.finish();

        let mut meta = self
            .part(CORE_PROPERTIES_PART)
            .map(parse_core_properties)
            .transpose()?
            .unwrap_or_default();
        enrich_meta(&mut meta, &elements);

        log::info!("Read {} element(s) from Word document", elements.len());
        Ok(Manuscript {
            meta,
            elements,
            ..Manuscript::default()
        })
    }

    fn extract_media(&self, dir: &Path) -> Result<usize, DocxSourceError> {
        let mut count = 0;
        for (name, contents) in self.media() {
            if count == 0 {
                fs::create_dir_all(dir).map_err(|e| DocxSourceError::Io(dir.to_path_buf(), e))?;
            }
            let path = dir.join(name);
            fs::write(&path, contents).map_err(|e| DocxSourceError::Io(path.clone(), e))?;
            count += 1;
        }
        Ok(count)
    }
}

/// Lookups shared by every paragraph
struct Context {
    /// Style id to lower-case display name
    style_names: HashMap<String, String>,
    /// Image relationship id to media file name
    image_targets: HashMap<String, String>,
    /// File names present under word/media
    media: HashSet<String>,
}

impl Context {
    fn style_name(&self, style_id: Option<&str>) -> String {
        style_id
            .map(|id| {
                self.style_names
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| id.trim().to_lowercase())
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct RawParagraph {
    style_id: Option<String>,
    text: String,
    /// Largest explicit font size in half-points
    size: u32,
    /// Left indent in twips
    indent: i64,
    runs: usize,
    bold_runs: usize,
    numbered: bool,
    image: Option<RawImage>,
}

impl RawParagraph {
    fn all_bold(&self) -> bool {
        self.runs > 0 && self.bold_runs == self.runs
    }
}

#[derive(Debug, Default)]
struct RawImage {
    rel_id: String,
    width_emu: u64,
    height_emu: u64,
}

#[derive(Debug)]
enum RawBlock {
    Paragraph(RawParagraph),
    Table(Vec<Vec<String>>),
}

/// One classified paragraph before merging
#[derive(Debug, PartialEq)]
enum Classified {
    Element(Element),
    BulletItem(String),
    ConclusionLine(String),
    QaAnswer(String),
    Caption(String),
}

/// Collects classified paragraphs, merging the ones that form one element
#[derive(Default)]
struct ElementSink {
    elements: Vec<Element>,
    /// The last element is a picture that has not taken a caption yet
    caption_open: bool,
}

impl ElementSink {
    fn push(&mut self, item: Classified) {
        let caption_open = std::mem::take(&mut self.caption_open);

        match (self.elements.last_mut(), item) {
            (Some(Element::Bullets { items }), Classified::BulletItem(text)) => items.push(text),
            (Some(Element::Conclusion { lines }), Classified::ConclusionLine(text)) => {
                lines.push(text)
            }
            (Some(Element::Qa { answers, .. }), Classified::QaAnswer(text)) => answers.push(text),
            (
                Some(Element::Image { caption, .. } | Element::ImagePlaceholder { caption }),
                Classified::Caption(text),
            ) if caption_open => *caption = text,
            (_, Classified::BulletItem(text)) => {
                self.elements.push(Element::Bullets { items: vec![text] })
            }
            (_, Classified::ConclusionLine(text)) => {
                self.elements.push(Element::Conclusion { lines: vec![text] })
            }
            (_, Classified::QaAnswer(text)) => self.elements.push(Element::Qa {
                question: String::new(),
                answers: vec![text],
            }),
            (_, Classified::Caption(text)) => self.elements.push(Element::Unknown {
                kind: "caption".to_string(),
                text: Some(text),
            }),
            (_, Classified::Element(Element::Prompt { label, text })) if label.is_empty() => {
                let label = self.take_label().unwrap_or_default();
                self.elements.push(Element::Prompt { label, text });
            }
            (_, Classified::Element(element)) => {
                self.caption_open = matches!(
                    element,
                    Element::Image { .. } | Element::ImagePlaceholder { .. }
                );
                self.elements.push(element);
            }
        }
    }

    /// Remove a trailing `Label:` body paragraph and return the label
    fn take_label(&mut self) -> Option<String> {
        let label = match self.elements.last() {
            Some(Element::Body { text, .. }) => LABEL_ONLY_RE
                .captures(text)
                .map(|caps| caps[1].trim().to_string())?,
            _ => return None,
        };
        self.elements.pop();
        Some(label)
    }

    fn finish(self) -> Vec<Element> {
        self.elements
    }
}

fn classify_paragraph(para: RawParagraph, context: &Context) -> Option<Classified> {
    let style = context.style_name(para.style_id.as_deref());
    let text = para.text.split_whitespace().join(" ");

    if let Some(image) = &para.image {
        let filename = context
            .image_targets
            .get(&image.rel_id)
            .filter(|name| context.media.contains(*name));
        let element = match filename {
            Some(filename) => Element::Image {
                filename: filename.clone(),
                width_emu: image.width_emu,
                height_emu: image.height_emu,
                caption: text,
            },
            None => Element::ImagePlaceholder { caption: text },
        };
        return Some(Classified::Element(element));
    }

    if text.is_empty() {
        return None;
    }

    let element = match style.as_str() {
        "ds-chaptertitle" => chapter_title(&text),
        "ds-insight" => Element::Insight { text },
        "ds-tip" => Element::Tip { text },
        "ds-warning" => Element::Warning { text },
        "ds-quote" => Element::Quote { text },
        "ds-qa-question" => Element::Qa {
            question: text,
            answers: Vec::new(),
        },
        "ds-qa-answer" => return Some(Classified::QaAnswer(text)),
        "ds-prompt" => match PROMPT_RE.captures(&text) {
            Some(caps) => Element::Prompt {
                label: caps[1].trim().to_string(),
                text: caps[2].trim().to_string(),
            },
            None => Element::Prompt {
                label: String::new(),
                text,
            },
        },
        "ds-conclusion" => return Some(Classified::ConclusionLine(text)),
        "ds-caption" => return Some(Classified::Caption(text)),
        _ => match heading_style_level(&style) {
            Some(level) => Element::heading(level, "", text),
            None if style.contains("list") || para.numbered => {
                return Some(Classified::BulletItem(text))
            }
            None => match para.size {
                size if size >= H1_MIN_SIZE => Element::heading(1, "", text),
                size if size >= H2_MIN_SIZE => Element::heading(2, "", text),
                size if size >= H3_MIN_SIZE => Element::heading(3, "", text),
                _ if para.all_bold() && text.chars().count() <= BOLD_HEADING_MAX_CHARS => {
                    Element::heading(3, "", text)
                }
                _ if para.indent >= QUOTE_MIN_INDENT => Element::Quote { text },
                _ => Element::body(text),
            },
        },
    };

    Some(Classified::Element(element))
}

/// Level of a built-in heading style name (English or Korean Word)
fn heading_style_level(style: &str) -> Option<u8> {
    (1..=3u8).find(|level| {
        style.contains(&format!("heading {}", level))
            || style == format!("heading{}", level)
            || style == format!("제목 {}", level)
    })
}

/// `title | phase | subtitle`
fn chapter_title(text: &str) -> Element {
    let mut parts = text.split('|').map(str::trim);
    Element::ChapterTitle {
        text: parts.next().unwrap_or_default().to_string(),
        phase: parts.next().unwrap_or_default().to_string(),
        sub: parts.next().unwrap_or_default().to_string(),
    }
}

/// First row is the header; up to two columns make a key/value table
fn classify_table(rows: Vec<Vec<String>>) -> Element {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();

    if columns <= 2 {
        let mut header = header.into_iter();
        Element::Table2 {
            col1: header.next().unwrap_or_default(),
            col2: header.next().unwrap_or_default(),
            rows,
        }
    } else {
        Element::Table3 {
            headers: header,
            rows,
        }
    }
}

/// Fill title and chapter from the first chapter title, then the first h1
fn enrich_meta(meta: &mut DocumentMeta, elements: &[Element]) {
    if let Some(Element::ChapterTitle { text, phase, .. }) = elements
        .iter()
        .find(|e| matches!(e, Element::ChapterTitle { .. }))
    {
        if meta.title.is_empty() {
            meta.title = text.clone();
        }
        if meta.chapter.is_empty() {
            meta.chapter = phase.clone();
        }
    }

    if meta.chapter.is_empty() {
        if let Some(Element::Heading { text, .. }) = elements
            .iter()
            .find(|e| matches!(e, Element::Heading { level: 1, .. }))
        {
            meta.chapter = text.clone();
        }
    }
}

fn xml_error(part: &'static str) -> impl FnOnce(quick_xml::Error) -> DocxSourceError {
    move |source| DocxSourceError::Xml { part, source }
}

/// Attribute value by local name, ignoring the namespace prefix
fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `w:b` and friends are on unless their value says otherwise
fn is_on(e: &BytesStart) -> bool {
    !matches!(get_attr(e, b"val").as_deref(), Some("0" | "false" | "off"))
}

/// Style id to lower-case display name from word/styles.xml
fn parse_style_names(xml: &[u8]) -> Result<HashMap<String, String>, DocxSourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut names = HashMap::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(xml_error(STYLES_PART))?
        {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"style" => current = get_attr(e, b"styleId"),
                b"name" => {
                    if let (Some(id), Some(name)) = (current.as_ref(), get_attr(e, b"val")) {
                        names.insert(id.clone(), name.trim().to_lowercase());
                    }
                }
                _ => {}
            },
            Event::End(ref e) if e.local_name().as_ref() == b"style" => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

/// Image relationship id to media file name from document.xml.rels
fn parse_image_targets(xml: &[u8]) -> Result<HashMap<String, String>, DocxSourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut targets = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(xml_error(DOCUMENT_RELS_PART))?
        {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let is_image = get_attr(e, b"Type").is_some_and(|t| t.ends_with("/image"));
                if let (true, Some(id), Some(target)) =
                    (is_image, get_attr(e, b"Id"), get_attr(e, b"Target"))
                {
                    let file = target.rsplit('/').next().unwrap_or_default().to_string();
                    targets.insert(id, file);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// Title and author from docProps/core.xml
fn parse_core_properties(xml: &[u8]) -> Result<DocumentMeta, DocxSourceError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut meta = DocumentMeta::default();
    let mut field: Option<&'static str> = None;
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(xml_error(CORE_PROPERTIES_PART))?
        {
            Event::Start(ref e) => {
                field = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"creator" => Some("creator"),
                    _ => None,
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().unwrap_or_default().trim().to_string();
                match field {
                    Some("title") => meta.title = text,
                    Some("creator") => meta.author = text,
                    _ => {}
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(meta)
}

/// Paragraphs and tables of word/document.xml in document order
fn parse_body(xml: &[u8]) -> Result<Vec<RawBlock>, DocxSourceError> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace inside runs is text
    reader.config_mut().trim_text(false);

    let mut body = BodyReader::default();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(xml_error(DOCUMENT_PART))?
        {
            Event::Start(ref e) => body.open(e, false),
            Event::Empty(ref e) => body.open(e, true),
            Event::End(ref e) => body.close(e.local_name().as_ref()),
            Event::Text(ref e) => {
                if body.in_text {
                    body.text(&e.unescape().unwrap_or_default());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(body.blocks)
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    cell: Option<Vec<String>>,
}

/// Event-driven state while walking word/document.xml
#[derive(Debug, Default)]
struct BodyReader {
    blocks: Vec<RawBlock>,
    paragraph: Option<RawParagraph>,
    /// Text-box paragraphs open inside the current paragraph
    nested_paragraphs: usize,
    /// Outermost table; nested tables feed its cells
    table: Option<TableState>,
    table_depth: usize,
    in_paragraph_props: bool,
    in_run: bool,
    run_bold: bool,
    in_text: bool,
}

impl BodyReader {
    fn open(&mut self, e: &BytesStart, empty: bool) {
        let name = e.local_name();
        let name = name.as_ref();

        if !empty {
            match name {
                b"tbl" => {
                    self.table_depth += 1;
                    if self.table_depth == 1 {
                        self.table = Some(TableState::default());
                    }
                    return;
                }
                b"tr" if self.table_depth == 1 => {
                    if let Some(table) = self.table.as_mut() {
                        table.rows.push(Vec::new());
                    }
                    return;
                }
                b"tc" if self.table_depth == 1 => {
                    if let Some(table) = self.table.as_mut() {
                        table.cell = Some(Vec::new());
                    }
                    return;
                }
                b"p" => {
                    if self.paragraph.is_some() {
                        self.nested_paragraphs += 1;
                    } else {
                        self.paragraph = Some(RawParagraph::default());
                    }
                    return;
                }
                _ => {}
            }
        }

        if self.nested_paragraphs > 0 {
            return;
        }
        let Some(para) = self.paragraph.as_mut() else {
            return;
        };

        match name {
            b"pPr" if !empty => self.in_paragraph_props = true,
            b"pStyle" if self.in_paragraph_props => para.style_id = get_attr(e, b"val"),
            b"numPr" if self.in_paragraph_props => para.numbered = true,
            b"ind" if self.in_paragraph_props => {
                para.indent = get_attr(e, b"left")
                    .or_else(|| get_attr(e, b"start"))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
            b"sz" if self.in_run || self.in_paragraph_props => {
                if let Some(size) = get_attr(e, b"val").and_then(|v| v.parse::<u32>().ok()) {
                    para.size = para.size.max(size);
                }
            }
            b"r" if !empty => {
                self.in_run = true;
                self.run_bold = false;
            }
            b"b" if self.in_run => self.run_bold = is_on(e),
            b"t" if self.in_run && !empty => self.in_text = true,
            b"tab" | b"br" | b"cr" if self.in_run => para.text.push(' '),
            b"drawing" if para.image.is_none() => para.image = Some(RawImage::default()),
            b"extent" => {
                if let Some(image) = para.image.as_mut().filter(|i| i.width_emu == 0) {
                    let emu = |attr: &[u8]| get_attr(e, attr).and_then(|v| v.parse().ok());
                    image.width_emu = emu(b"cx").unwrap_or(0);
                    image.height_emu = emu(b"cy").unwrap_or(0);
                }
            }
            b"blip" => {
                if let (Some(image), Some(rel_id)) = (para.image.as_mut(), get_attr(e, b"embed")) {
                    image.rel_id = rel_id;
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"p" if self.nested_paragraphs > 0 => self.nested_paragraphs -= 1,
            b"p" => {
                if let Some(para) = self.paragraph.take() {
                    self.finish_paragraph(para);
                }
                self.in_paragraph_props = false;
                self.in_run = false;
                self.in_text = false;
            }
            _ if self.nested_paragraphs > 0 => {}
            b"pPr" => self.in_paragraph_props = false,
            b"r" if self.in_run => {
                self.in_run = false;
                if let Some(para) = self.paragraph.as_mut() {
                    para.runs += 1;
                    if self.run_bold {
                        para.bold_runs += 1;
                    }
                }
            }
            b"t" => self.in_text = false,
            b"tc" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    let cell = table.cell.take().unwrap_or_default().join("\n");
                    if let Some(row) = table.rows.last_mut() {
                        row.push(cell.trim().to_string());
                    }
                }
            }
            b"tbl" if self.table_depth > 0 => {
                self.table_depth -= 1;
                if self.table_depth == 0 {
                    if let Some(table) = self.table.take() {
                        self.blocks.push(RawBlock::Table(table.rows));
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.nested_paragraphs > 0 {
            return;
        }
        if let Some(para) = self.paragraph.as_mut() {
            para.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self, para: RawParagraph) {
        match self.table.as_mut() {
            Some(table) => {
                if let Some(cell) = table.cell.as_mut() {
                    cell.push(para.text.trim().to_string());
                }
            }
            None => self.blocks.push(RawBlock::Paragraph(para)),
        }
    }
}
