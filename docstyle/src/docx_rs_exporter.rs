//! DOCX export using the docx-rs library
//!
//! Serializes a [`DocumentTree`] into a Word package. The tree already carries
//! every colour, size and spacing; this module only maps the neutral values
//! onto docx-rs builders. Paragraphs without an explicit alignment and runs
//! without an explicit colour get the document defaults here.

use crate::document_tree::{
    Align, Block, BorderLine, Borders, BulletStyle, Cell, DocDefaults, DocumentTree, Inline,
    LineStyle, PageSection, PageSetup, Para, Run as RunSpec, SectionStart, TableBlock, TableWidth,
};
use docx_rs::{
    AbstractNumbering, AlignmentType, BorderType, BreakType, Docx, FieldCharType, Footer, Header,
    IndentLevel, InstrPAGE, InstrText, Level, LevelJc, LevelText, LineSpacing, NumberFormat,
    Numbering, NumberingId, PageMargin, PageSize, Paragraph, ParagraphBorder,
    ParagraphBorderPosition, ParagraphBorders, Pic, Run, RunFonts, SectionProperty, SectionType,
    Shading, ShdType, SpecialIndentType, Start, Style, StyleType, Table, TableBorders, TableCell,
    TableCellBorder, TableCellBorderPosition, TableCellMargins, TableLayoutType, TableOfContents,
    TableRow, VAlignType, WidthType,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Numbering id shared by every bullet paragraph
const BULLET_NUMBERING_ID: usize = 1;

/// Distance of header and footer from the page edge in twips
const HEADER_FOOTER_DISTANCE: i32 = 567;

/// Full width in the fiftieths-of-a-percent unit Word uses for `pct`
const PERCENT_UNIT: usize = 50;

/// Export to Microsoft Word (.docx) using docx-rs
///
/// # Parameters
/// * `tree` - The assembled document
/// * `output_path` - Path where the .docx file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to DOCX format
/// * `Err(ExportError)` - Error during export
pub fn to_docx(tree: &DocumentTree, output_path: &Path) -> Result<(), ExportError> {
    log::info!(
        "Creating DOCX with docx-rs: {} section(s), {} image(s)",
        tree.sections.len(),
        tree.image_count()
    );

    let docx = build_docx(tree);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ExportError::Io(parent.to_path_buf(), e))?;
        }
    }

    log::info!("Writing DOCX to: {}", output_path.display());
    let file = std::fs::File::create(output_path)
        .map_err(|e| ExportError::Io(output_path.to_path_buf(), e))?;
    docx.build()
        .pack(file)
        .map_err(|e| ExportError::Pack(e.to_string()))?;

    log::info!("Successfully wrote {}", output_path.display());
    Ok(())
}

/// Build the in-memory docx-rs document
pub fn build_docx(tree: &DocumentTree) -> Docx {
    let defaults = &tree.defaults;

    let mut docx = Docx::new()
        .default_fonts(fonts(&defaults.font))
        .default_size(defaults.size as usize);

    // The last section is described by the document itself; header and
    // footer references are added to it afterwards.
    if let Some(last) = tree.sections.last() {
        docx.document = docx
            .document
            .default_section_property(section_property(last, &tree.page));
    }

    docx = add_heading_styles(docx, defaults);
    docx = add_bullet_numbering(docx, &tree.bullets);

    let mut header = Header::new();
    for block in &tree.header {
        header = match block {
            Block::Paragraph(para) => header.add_paragraph(paragraph(para, defaults)),
            Block::Table(table) => header.add_table(self::table(table, defaults)),
            Block::TableOfContents { .. } => header,
        };
    }
    let mut footer = Footer::new();
    for block in &tree.footer {
        footer = match block {
            Block::Paragraph(para) => footer.add_paragraph(paragraph(para, defaults)),
            Block::Table(table) => footer.add_table(self::table(table, defaults)),
            Block::TableOfContents { .. } => footer,
        };
    }
    docx = docx.header(header).footer(footer);

    // Earlier sections point at the same header and footer parts
    let header_reference = docx.document.section_property.header_reference.clone();
    let footer_reference = docx.document.section_property.footer_reference.clone();

    // Every earlier section closes with a paragraph carrying its properties
    let last = tree.sections.len().saturating_sub(1);
    for (index, section) in tree.sections.iter().enumerate() {
        for block in &section.blocks {
            docx = append_block(docx, block, defaults);
        }
        if index < last {
            let mut property = section_property(section, &tree.page);
            property.header_reference = header_reference.clone();
            property.footer_reference = footer_reference.clone();
            docx = docx.add_paragraph(Paragraph::new().section_property(property));
        }
    }

    docx
}

fn append_block(docx: Docx, block: &Block, defaults: &DocDefaults) -> Docx {
    match block {
        Block::Paragraph(para) => docx.add_paragraph(paragraph(para, defaults)),
        Block::Table(table) => docx.add_table(self::table(table, defaults)),
        Block::TableOfContents { max_level } => docx.add_table_of_contents(
            TableOfContents::new().heading_styles_range(1, *max_level as usize),
        ),
    }
}

fn page_margin(page: &PageSetup) -> PageMargin {
    PageMargin::new()
        .top(page.margins.top as i32)
        .right(page.margins.right as i32)
        .bottom(page.margins.bottom as i32)
        .left(page.margins.left as i32)
        .header(HEADER_FOOTER_DISTANCE)
        .footer(HEADER_FOOTER_DISTANCE)
}

/// Page, margin and column properties of one section
fn section_property(section: &PageSection, page: &PageSetup) -> SectionProperty {
    let mut property = SectionProperty::new()
        .page_size(PageSize::new().size(page.width, page.height))
        .page_margin(page_margin(page));
    property.columns = section.columns as usize;
    property.space = section.column_space as usize;
    if section.start == SectionStart::Continuous {
        property.section_type = Some(SectionType::Continuous);
    }
    property
}

/// Heading styles the table of contents collects from
fn add_heading_styles(mut docx: Docx, defaults: &DocDefaults) -> Docx {
    for (style_id, name) in [
        ("Heading1", "Heading 1"),
        ("Heading2", "Heading 2"),
        ("Heading3", "Heading 3"),
    ] {
        let style = Style::new(style_id, StyleType::Paragraph)
            .name(name)
            .bold()
            .color(&defaults.color);
        docx = docx.add_style(style);
    }
    docx
}

/// Get the heading style ID for a given heading level
fn heading_style_id(level: u8) -> &'static str {
    match level {
        0 | 1 => "Heading1",
        2 => "Heading2",
        _ => "Heading3",
    }
}

fn add_bullet_numbering(docx: Docx, bullets: &BulletStyle) -> Docx {
    let level = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("bullet"),
        LevelText::new(&bullets.symbol),
        LevelJc::new("left"),
    )
    .indent(
        Some(bullets.indent_left as i32),
        Some(SpecialIndentType::Hanging(bullets.hanging as i32)),
        None,
        None,
    )
    .fonts(fonts(&bullets.font))
    .color(&bullets.color);

    docx.add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(level))
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
}

fn fonts(font: &str) -> RunFonts {
    RunFonts::new().ascii(font).hi_ansi(font).east_asia(font)
}

fn alignment(align: Align) -> AlignmentType {
    match align {
        Align::Left => AlignmentType::Left,
        Align::Center => AlignmentType::Center,
        Align::Right => AlignmentType::Right,
        Align::Justify => AlignmentType::Both,
    }
}

fn border_type(style: LineStyle) -> BorderType {
    match style {
        LineStyle::Single => BorderType::Single,
        LineStyle::Thick => BorderType::Thick,
        LineStyle::None => BorderType::Nil,
    }
}

fn shading(fill: &str) -> Shading {
    Shading::new().shd_type(ShdType::Clear).color("auto").fill(fill)
}

/// Create a docx Paragraph from a styled paragraph
fn paragraph(para: &Para, defaults: &DocDefaults) -> Paragraph {
    let mut p = Paragraph::new().align(alignment(para.align.unwrap_or(defaults.align)));

    if let Some(level) = para.heading_level {
        p = p.style(heading_style_id(level));
    }
    if let Some(spacing) = para.spacing {
        let mut line_spacing = LineSpacing::new().before(spacing.before).after(spacing.after);
        if let Some(line) = spacing.line {
            line_spacing = line_spacing.line(line as _);
        }
        p = p.line_spacing(line_spacing);
    }
    if let Some(indent) = para.indent {
        p = p.indent(Some(indent.left as i32), None, Some(indent.right as i32), None);
    }
    if para.bullet {
        p = p.numbering(NumberingId::new(BULLET_NUMBERING_ID), IndentLevel::new(0));
    }
    if !para.borders.is_empty() {
        p = p.set_borders(paragraph_borders(&para.borders));
    }

    for spec in &para.runs {
        p = p.add_run(run(spec, para.shading.as_deref(), defaults));
    }
    p
}

fn paragraph_borders(borders: &Borders) -> ParagraphBorders {
    let edges = [
        (ParagraphBorderPosition::Top, &borders.top),
        (ParagraphBorderPosition::Bottom, &borders.bottom),
        (ParagraphBorderPosition::Left, &borders.left),
        (ParagraphBorderPosition::Right, &borders.right),
    ];

    edges
        .into_iter()
        .filter_map(|(position, line)| line.as_ref().map(|line| (position, line)))
        .filter(|(_, line)| line.style != LineStyle::None)
        .fold(ParagraphBorders::with_empty(), |acc, (position, line)| {
            acc.set(
                ParagraphBorder::new(position)
                    .val(border_type(line.style))
                    .size(line.size as usize)
                    .color(&line.color)
                    .space(line.space as usize),
            )
        })
}

/// Create a docx Run; `fill` is the enclosing paragraph's background
fn run(spec: &RunSpec, fill: Option<&str>, defaults: &DocDefaults) -> Run {
    let mut run = match &spec.content {
        Inline::Text(text) => Run::new().add_text(text),
        Inline::Image(image) => Run::new().add_image(
            Pic::new(&image.bytes).size(image.width_emu as u32, image.height_emu as u32),
        ),
        Inline::PageNumber => Run::new()
            .add_field_char(FieldCharType::Begin, false)
            .add_instr_text(InstrText::PAGE(InstrPAGE::new()))
            .add_field_char(FieldCharType::Separate, false)
            .add_text("1")
            .add_field_char(FieldCharType::End, false),
        Inline::PageBreak => Run::new().add_break(BreakType::Page),
    };

    if spec.bold {
        run = run.bold();
    }
    if spec.italic {
        run = run.italic();
    }
    if let Some(size) = spec.size {
        run = run.size(size as usize);
    }
    run = run.color(spec.color.as_deref().unwrap_or(&defaults.color));
    if let Some(font) = &spec.font {
        run = run.fonts(fonts(font));
    }
    if let Some(fill) = fill {
        run = run.shading(shading(fill));
    }
    run
}

/// Create a docx Table from a table block
fn table(spec: &TableBlock, defaults: &DocDefaults) -> Table {
    let rows: Vec<TableRow> = spec
        .rows
        .iter()
        .map(|cells| TableRow::new(cells.iter().map(|c| cell(c, defaults)).collect()))
        .collect();

    let margins = spec.cell_margins;
    let mut table = Table::new(rows)
        .margins(TableCellMargins::new().margin(
            margins.top as usize,
            margins.right as usize,
            margins.bottom as usize,
            margins.left as usize,
        ))
        .layout(TableLayoutType::Fixed);

    table = match spec.width {
        TableWidth::Fixed(width) => table.width(width as usize, WidthType::Dxa),
        TableWidth::Percent(percent) => {
            table.width(percent as usize * PERCENT_UNIT, WidthType::Pct)
        }
    };
    if !spec.column_widths.is_empty() {
        table = table.set_grid(spec.column_widths.iter().map(|w| *w as usize).collect());
    }
    if spec.borderless {
        table = table.set_borders(TableBorders::with_empty());
    }
    table
}

/// Create a table cell
fn cell(spec: &Cell, defaults: &DocDefaults) -> TableCell {
    let mut cell = TableCell::new();
    for para in &spec.paragraphs {
        cell = cell.add_paragraph(paragraph(para, defaults));
    }
    if spec.paragraphs.is_empty() {
        cell = cell.add_paragraph(Paragraph::new());
    }

    if let Some(width) = spec.width {
        cell = cell.width(width as usize, WidthType::Dxa);
    }
    if let Some(fill) = &spec.fill {
        cell = cell.shading(shading(fill));
    }
    if spec.v_center {
        cell = cell.vertical_align(VAlignType::Center);
    }

    let edges = [
        (TableCellBorderPosition::Top, &spec.borders.top),
        (TableCellBorderPosition::Bottom, &spec.borders.bottom),
        (TableCellBorderPosition::Left, &spec.borders.left),
        (TableCellBorderPosition::Right, &spec.borders.right),
    ];
    for (position, line) in edges {
        if let Some(line) = line {
            cell = cell.set_border(cell_border(position, line));
        }
    }
    cell
}

fn cell_border(position: TableCellBorderPosition, line: &BorderLine) -> TableCellBorder {
    TableCellBorder::new(position)
        .border_type(border_type(line.style))
        .size(line.size as usize)
        .color(&line.color)
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to write DOCX: {0}")]
    Pack(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_tree::{Margins, A4_HEIGHT, A4_WIDTH};

    fn tree(sections: Vec<PageSection>) -> DocumentTree {
        DocumentTree {
            page: PageSetup {
                width: A4_WIDTH,
                height: A4_HEIGHT,
                margins: Margins::uniform(1080),
            },
            defaults: DocDefaults {
                font: "Arial".to_string(),
                size: 20,
                color: "1E293B".to_string(),
                align: Align::Left,
            },
            bullets: BulletStyle {
                symbol: "\u{25B8}".to_string(),
                indent_left: 480,
                hanging: 240,
                font: "Arial".to_string(),
                color: "3B82F6".to_string(),
            },
            header: vec![Para::new().run(RunSpec::text("Header")).into()],
            footer: vec![Para::new().run(RunSpec::page_number()).into()],
            sections,
        }
    }

    #[test]
    fn test_heading_style_id() {
        assert_eq!(heading_style_id(1), "Heading1");
        assert_eq!(heading_style_id(2), "Heading2");
        assert_eq!(heading_style_id(3), "Heading3");
        assert_eq!(heading_style_id(7), "Heading3");
    }

    #[test]
    fn test_alignment_mapping() {
        assert!(matches!(alignment(Align::Justify), AlignmentType::Both));
        assert!(matches!(alignment(Align::Center), AlignmentType::Center));
    }

    #[test]
    fn test_writes_docx_package() {
        let body = vec![
            Para::new()
                .heading_level(1)
                .run(RunSpec::text("Intro").bold())
                .into(),
            Para::new()
                .shading("EFF6FF")
                .borders(Borders::left_bar(BorderLine::single("93C5FD", 8)))
                .run(RunSpec::text("Boxed"))
                .into(),
            Para::new().bullet().run(RunSpec::text("Item")).into(),
            Block::TableOfContents { max_level: 3 },
        ];
        let sections = vec![
            PageSection::single_column(SectionStart::Continuous, body.clone()),
            PageSection {
                start: SectionStart::Continuous,
                columns: 2,
                column_space: 720,
                blocks: body,
            },
        ];

        let output = std::env::temp_dir()
            .join("docstyle-exporter-test")
            .join("out.docx");
        to_docx(&tree(sections), &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_every_section_references_header_and_footer() {
        let body = vec![Para::new().run(RunSpec::text("Body")).into()];
        let sections = vec![
            PageSection::single_column(SectionStart::Continuous, body.clone()),
            PageSection::single_column(SectionStart::NewPage, body.clone()),
            PageSection {
                start: SectionStart::Continuous,
                columns: 2,
                column_space: 720,
                blocks: body,
            },
        ];

        let xml = build_docx(&tree(sections)).build().document;
        let xml = String::from_utf8(xml).unwrap();

        assert_eq!(xml.matches("<w:sectPr>").count(), 3);
        assert_eq!(xml.matches("<w:headerReference").count(), 3);
        assert_eq!(xml.matches("<w:footerReference").count(), 3);
    }
}
