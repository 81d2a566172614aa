//! Backend-neutral document tree
//!
//! The renderer and assembler describe the document with these plain values:
//! styled paragraphs and tables grouped into page sections, plus a shared
//! header, footer and page setup. A backend (see `docx_rs_exporter`) turns the
//! tree into a file; nothing upstream depends on any particular backend.

/// RRGGBB colour
pub type Color = String;

/// A4 page width in twips
pub const A4_WIDTH: u32 = 11906;

/// A4 page height in twips
pub const A4_HEIGHT: u32 = 16838;

/// Paragraph alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Line style of a border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Single,
    Thick,
    None,
}

/// One border edge; `size` is in eighths of a point, `space` in points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderLine {
    pub style: LineStyle,
    pub size: u32,
    pub color: Color,
    pub space: u32,
}

impl BorderLine {
    pub fn single(color: &str, size: u32) -> Self {
        Self {
            style: LineStyle::Single,
            size,
            color: color.to_string(),
            space: 0,
        }
    }

    pub fn thick(color: &str, size: u32) -> Self {
        Self {
            style: LineStyle::Thick,
            size,
            color: color.to_string(),
            space: 0,
        }
    }

    /// Explicitly no border
    pub fn none() -> Self {
        Self {
            style: LineStyle::None,
            size: 0,
            color: "FFFFFF".to_string(),
            space: 0,
        }
    }

    pub fn space(mut self, space: u32) -> Self {
        self.space = space;
        self
    }
}

/// Border edges of a paragraph or cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Borders {
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
}

impl Borders {
    /// The same line on all four edges
    pub fn all(line: BorderLine) -> Self {
        Self {
            top: Some(line.clone()),
            bottom: Some(line.clone()),
            left: Some(line.clone()),
            right: Some(line),
        }
    }

    /// A single left bar, the other edges explicitly empty
    pub fn left_bar(line: BorderLine) -> Self {
        Self {
            top: Some(BorderLine::none()),
            bottom: Some(BorderLine::none()),
            left: Some(line),
            right: Some(BorderLine::none()),
        }
    }

    pub fn top(mut self, line: BorderLine) -> Self {
        self.top = Some(line);
        self
    }

    pub fn bottom(mut self, line: BorderLine) -> Self {
        self.bottom = Some(line);
        self
    }

    pub fn left(mut self, line: BorderLine) -> Self {
        self.left = Some(line);
        self
    }

    pub fn right(mut self, line: BorderLine) -> Self {
        self.right = Some(line);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// Paragraph spacing; `line` uses 240 = single spacing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
    pub line: Option<u32>,
}

/// Left and right indent in twips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indent {
    pub left: u32,
    pub right: u32,
}

/// Image bytes with their display size in EMU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub width_emu: u64,
    pub height_emu: u64,
}

/// Content of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Image(ImageData),
    /// Current page number field
    PageNumber,
    /// Hard page break
    PageBreak,
}

/// A formatted run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub content: Inline,
    pub bold: bool,
    pub italic: bool,
    /// Half-points
    pub size: Option<u32>,
    pub color: Option<Color>,
    pub font: Option<String>,
}

impl Run {
    fn with_content(content: Inline) -> Self {
        Self {
            content,
            bold: false,
            italic: false,
            size: None,
            color: None,
            font: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(Inline::Text(text.into()))
    }

    pub fn image(image: ImageData) -> Self {
        Self::with_content(Inline::Image(image))
    }

    pub fn page_number() -> Self {
        Self::with_content(Inline::PageNumber)
    }

    pub fn page_break() -> Self {
        Self::with_content(Inline::PageBreak)
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn bold_if(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn font(mut self, font: &str) -> Self {
        self.font = Some(font.to_string());
        self
    }

    /// The run's text, if it is a text run
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            Inline::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A styled paragraph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Para {
    pub runs: Vec<Run>,
    /// `None` uses the document default alignment
    pub align: Option<Align>,
    pub spacing: Option<Spacing>,
    pub indent: Option<Indent>,
    /// Background fill
    pub shading: Option<Color>,
    pub borders: Borders,
    /// Member of the shared bullet list
    pub bullet: bool,
    /// Outline level for the table of contents
    pub heading_level: Option<u8>,
}

impl Para {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty paragraph used as vertical space
    pub fn spacer(after: u32) -> Self {
        Self::new().spacing(0, after)
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn runs(mut self, runs: impl IntoIterator<Item = Run>) -> Self {
        self.runs.extend(runs);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        let line = self.spacing.and_then(|s| s.line);
        self.spacing = Some(Spacing {
            before,
            after,
            line,
        });
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        let mut spacing = self.spacing.unwrap_or_default();
        spacing.line = Some(line);
        self.spacing = Some(spacing);
        self
    }

    pub fn indent(mut self, left: u32, right: u32) -> Self {
        self.indent = Some(Indent { left, right });
        self
    }

    pub fn shading(mut self, fill: &str) -> Self {
        self.shading = Some(fill.to_string());
        self
    }

    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    pub fn bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    pub fn heading_level(mut self, level: u8) -> Self {
        self.heading_level = Some(level);
        self
    }

    /// Concatenated text of all text runs
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::as_text).collect()
    }
}

/// Width of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableWidth {
    /// Twips
    Fixed(u32),
    /// Percent of the text column
    Percent(u32),
}

/// Inner cell padding in twips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellMargins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// One table cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub paragraphs: Vec<Para>,
    /// Twips; `None` lets the table decide
    pub width: Option<u32>,
    pub fill: Option<Color>,
    pub borders: Borders,
    pub v_center: bool,
}

/// A table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    pub width: TableWidth,
    pub column_widths: Vec<u32>,
    pub cell_margins: CellMargins,
    /// Draw no table-level borders
    pub borderless: bool,
    pub rows: Vec<Vec<Cell>>,
}

/// A body-level block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Para),
    Table(TableBlock),
    /// Generated table of contents over heading levels `1..=max_level`
    TableOfContents { max_level: u8 },
}

impl From<Para> for Block {
    fn from(para: Para) -> Self {
        Block::Paragraph(para)
    }
}

impl From<TableBlock> for Block {
    fn from(table: TableBlock) -> Self {
        Block::Table(table)
    }
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Para> {
        match self {
            Block::Paragraph(para) => Some(para),
            _ => None,
        }
    }
}

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn uniform(size: u32) -> Self {
        Self {
            top: size,
            right: size,
            bottom: size,
            left: size,
        }
    }
}

/// Page size and margins shared by every section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    pub width: u32,
    pub height: u32,
    pub margins: Margins,
}

/// How a section starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionStart {
    #[default]
    NewPage,
    Continuous,
}

/// A run of blocks sharing one column layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSection {
    pub start: SectionStart,
    pub columns: u32,
    /// Gap between columns in twips
    pub column_space: u32,
    pub blocks: Vec<Block>,
}

impl PageSection {
    pub fn single_column(start: SectionStart, blocks: Vec<Block>) -> Self {
        Self {
            start,
            columns: 1,
            column_space: 0,
            blocks,
        }
    }
}

/// Run and paragraph defaults of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocDefaults {
    pub font: String,
    /// Half-points
    pub size: u32,
    pub color: Color,
    pub align: Align,
}

/// The one bullet list style all bullet paragraphs share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletStyle {
    pub symbol: String,
    pub indent_left: u32,
    pub hanging: u32,
    pub font: String,
    pub color: Color,
}

/// A fully assembled document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    pub page: PageSetup,
    pub defaults: DocDefaults,
    pub bullets: BulletStyle,
    /// Header band repeated on every page
    pub header: Vec<Block>,
    /// Footer band repeated on every page
    pub footer: Vec<Block>,
    pub sections: Vec<PageSection>,
}

impl DocumentTree {
    /// All body blocks in document order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// All body paragraphs in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Para> {
        self.blocks().filter_map(Block::as_paragraph)
    }

    /// Number of embedded images
    pub fn image_count(&self) -> usize {
        self.paragraphs()
            .flat_map(|p| p.runs.iter())
            .filter(|r| matches!(r.content, Inline::Image(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_para_builder() {
        let para = Para::new()
            .line(384)
            .spacing(120, 160)
            .run(Run::text("Hello, ").bold())
            .run(Run::text("world").italic().size(20).color("1E293B"));

        assert_eq!(
            para.spacing,
            Some(Spacing {
                before: 120,
                after: 160,
                line: Some(384)
            })
        );
        assert_eq!(para.text(), "Hello, world");
        assert!(para.runs[0].bold);
        assert_eq!(para.runs[1].color.as_deref(), Some("1E293B"));
    }

    #[test]
    fn test_left_bar_borders() {
        let borders = Borders::left_bar(BorderLine::single("93C5FD", 8).space(12));
        assert_eq!(borders.left.as_ref().map(|l| l.space), Some(12));
        assert_eq!(
            borders.top.as_ref().map(|l| l.style),
            Some(LineStyle::None)
        );
        assert!(Borders::default().is_empty());
    }
}
