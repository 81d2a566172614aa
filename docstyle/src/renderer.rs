//! Element renderer
//!
//! Maps one manuscript [`Element`] to the blocks that draw it. Colours, fonts,
//! sizes and gaps come from the [`StyleContext`]; indents, border weights and
//! the neutral greys of tables and image boxes are fixed layout constants.
//! Every element is followed by a small spacer paragraph whose height depends
//! on the kind.

use crate::document_tree::{
    Align, Block, BorderLine, Borders, Cell, CellMargins, ImageData, Para, Run, TableBlock,
    TableWidth,
};
use crate::manuscript::Element;
use crate::style::StyleContext;
use std::path::{Path, PathBuf};

/// Widest image that fits the text column, in EMU
pub const MAX_IMAGE_WIDTH_EMU: u64 = 6_096_000;

/// EMU per pixel at 96 DPI
const EMUS_PER_PIXEL: u64 = 9525;

const TABLE2_WIDTHS: [u32; 2] = [3200, 5826];
const TABLE3_WIDTHS: [u32; 3] = [2000, 3200, 3826];
const TABLE_BORDER: &str = "D1D5DB";
const TABLE_STRIPE: &str = "F8FAFC";
const TABLE_CELL_SIZE: u32 = 19;
const TABLE_CELL_MARGINS: CellMargins = CellMargins {
    top: 100,
    bottom: 100,
    left: 160,
    right: 120,
};

const QUOTE_FILL: &str = "F8FAFC";
const PLACEHOLDER_FILL: &str = "F1F5F9";
const PLACEHOLDER_BORDER: &str = "CBD5E1";
const PLACEHOLDER_TEXT: &str = "9CA3AF";
const PLACEHOLDER_FONT: &str = "Arial";
const CAPTION_COLOR: &str = "6B7280";
const TERMINAL_FONT: &str = "Consolas";

/// Box text size in half-points
const BOX_SIZE: u32 = 20;

/// Render one element
///
/// # Parameters
/// * `element` - The element to draw
/// * `style` - Resolved style of this render
/// * `image_dir` - Directory image file names are resolved against
///
/// # Returns
/// * `Vec<Block>` - The element's blocks, trailing spacer included; empty for
///   an unknown kind without text
pub fn render_element(element: &Element, style: &StyleContext, image_dir: &Path) -> Vec<Block> {
    let (mut blocks, spacer) = match element {
        Element::ChapterTitle { phase, text, sub } => {
            return chapter_title(phase, text, sub, style);
        }
        Element::Heading { level, num, text } => match *level {
            1 => (vec![h1(num, text, style)], Some(40)),
            2 => (vec![h2(text, style)], Some(20)),
            _ => (vec![h3(text, style)], Some(10)),
        },
        Element::Body { text, indent } => (vec![body_text(text, *indent, style)], Some(20)),
        Element::Lead { text } => (vec![lead_paragraph(text, style)], Some(20)),
        Element::Quote { text } => (vec![quote_box(text, style)], Some(20)),
        Element::Insight { text } if style.is_tech() => (terminal_box(text, style), Some(20)),
        Element::Insight { text } => (vec![insight_box(text, style)], Some(20)),
        Element::Tip { text } => (vec![tip_box(text, style)], Some(20)),
        Element::Warning { text } => (vec![warning_box(text, style)], Some(20)),
        Element::Qa { question, answers } => return qa_block(question, answers, style),
        Element::Prompt { label, text } => return prompt_box(label, text, style),
        Element::Conclusion { lines } => return conclusion_box(lines, style),
        Element::Bullets { items } => (bullet_list(items, style), Some(40)),
        Element::Image {
            filename,
            width_emu,
            height_emu,
            caption,
        } => (
            image(image_dir, filename, *width_emu, *height_emu, caption),
            Some(20),
        ),
        Element::ImagePlaceholder { caption } => (image_placeholder(caption), Some(20)),
        Element::Table2 { col1, col2, rows } => {
            (vec![table2(col1, col2, rows, style).into()], Some(60))
        }
        Element::Table3 { headers, rows } => (vec![table3(headers, rows, style).into()], Some(60)),
        Element::Hr { size } => (vec![hr(&style.palette.rule, *size)], Some(40)),
        Element::SectionDivider { text } => (vec![section_divider(text, style)], Some(60)),
        Element::Empty { height } => (vec![empty(*height)], None),
        Element::Unknown { kind, text } => match text {
            Some(text) => {
                log::warn!("Unknown element type '{}', rendering as body text", kind);
                (vec![body_text(text, 0, style)], None)
            }
            None => {
                log::warn!("Unknown element type '{}' without text, skipped", kind);
                (Vec::new(), None)
            }
        },
    };

    if let Some(height) = spacer {
        blocks.push(empty(height));
    }
    blocks
}

/// Path an image element's file name resolves to
pub fn image_path(image_dir: &Path, filename: &str) -> PathBuf {
    image_dir.join(filename)
}

/// Whether an image element's file is missing
pub fn is_image_missing(image_dir: &Path, filename: &str) -> bool {
    filename.trim().is_empty() || !image_path(image_dir, filename).is_file()
}

/// Text run in the body font
fn run(text: &str, style: &StyleContext) -> Run {
    Run::text(text).font(&style.body_font)
}

/// Text run in the heading font
fn heading_run(text: &str, style: &StyleContext) -> Run {
    Run::text(text).font(&style.heading_font).bold()
}

/// Spacer paragraph of the given height
pub fn empty(height: u32) -> Block {
    Para::spacer(height).into()
}

fn body_align(style: &StyleContext) -> Align {
    if style.justify {
        Align::Justify
    } else {
        Align::Left
    }
}

/// Left-bar box used by quote, insight, tip and warning
fn side_bar_box(fill: &str, bar: &str, before_after: u32) -> Para {
    Para::new()
        .shading(fill)
        .borders(Borders::left_bar(BorderLine::single(bar, 8).space(12)))
        .spacing(before_after, before_after)
        .indent(280, 240)
}

fn h1(num: &str, text: &str, style: &StyleContext) -> Block {
    let mut para = Para::new()
        .spacing(style.gaps.h1.before, style.gaps.h1.after)
        .borders(Borders::default().bottom(BorderLine::single(&style.palette.rule, 2).space(12)))
        .heading_level(1);
    if !num.is_empty() {
        para = para.run(
            heading_run(&format!("{}.  ", num), style)
                .size(style.sizes.h1)
                .color(&style.palette.accent),
        );
    }
    para.run(
        heading_run(text, style)
            .size(style.sizes.h1)
            .color(&style.palette.dark),
    )
    .into()
}

fn h2(text: &str, style: &StyleContext) -> Block {
    Para::new()
        .spacing(style.gaps.h2.before, style.gaps.h2.after)
        .heading_level(2)
        .run(
            heading_run(text, style)
                .size(style.sizes.h2)
                .color(&style.palette.blue2),
        )
        .into()
}

fn h3(text: &str, style: &StyleContext) -> Block {
    Para::new()
        .spacing(style.gaps.h3.before, style.gaps.h3.after)
        .heading_level(3)
        .run(
            heading_run(text, style)
                .size(style.sizes.h3)
                .color(&style.palette.dark),
        )
        .into()
}

fn body_text(text: &str, indent: u32, style: &StyleContext) -> Block {
    Para::new()
        .spacing(style.gaps.body.before, style.gaps.body.after)
        .line(style.line_spacing)
        .indent(indent, 0)
        .align(body_align(style))
        .run(
            run(text, style)
                .size(style.sizes.body)
                .color(&style.palette.text),
        )
        .into()
}

/// First paragraph after a heading: one step larger and darker than body text
fn lead_paragraph(text: &str, style: &StyleContext) -> Block {
    Para::new()
        .spacing(style.gaps.lead.before, style.gaps.lead.after)
        .line(style.line_spacing)
        .align(body_align(style))
        .run(
            run(text, style)
                .size(style.sizes.body + 2)
                .color(&style.palette.dark),
        )
        .into()
}

fn chapter_title(phase: &str, text: &str, sub: &str, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;

    if style.is_minimal() {
        return vec![
            empty(400),
            Para::new()
                .align(Align::Center)
                .run(heading_run(text, style).size(48).color(&palette.dark))
                .into(),
            Para::new()
                .align(Align::Center)
                .run(run(sub, style).size(24).color(&palette.gray).italic())
                .into(),
            empty(600),
        ];
    }

    let band = || Para::new().shading(&palette.bg_head).indent(240, 240);
    vec![
        band()
            .spacing(0, 0)
            .borders(Borders::default().bottom(BorderLine::thick(&palette.accent, 12)))
            .run(run(phase, style).size(20).color(&palette.blue2).bold())
            .into(),
        band()
            .spacing(0, 40)
            .run(heading_run(text, style).size(34).color(&palette.white))
            .into(),
        band()
            .spacing(0, 160)
            .run(run(sub, style).size(20).color(&palette.gray3).italic())
            .into(),
        empty(100),
    ]
}

fn quote_box(text: &str, style: &StyleContext) -> Block {
    side_bar_box(QUOTE_FILL, &style.palette.box_border, 160)
        .run(
            run(text, style)
                .size(BOX_SIZE)
                .color(&style.palette.gray)
                .italic(),
        )
        .into()
}

fn insight_box(text: &str, style: &StyleContext) -> Block {
    side_bar_box(&style.palette.bg_red, &style.palette.accent, 160)
        .run(
            run(text, style)
                .size(BOX_SIZE)
                .color(&style.palette.dark)
                .bold(),
        )
        .into()
}

/// Insight drawn as a console window: a title strip and a prompt line
fn terminal_box(text: &str, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    vec![
        Para::new()
            .shading(&palette.bg_head)
            .borders(Borders::default().top(BorderLine::single(&palette.accent, 2)))
            .spacing(160, 0)
            .indent(240, 240)
            .run(Run::text("\u{25CF} \u{25CF} \u{25CF}  ").size(16).color(&palette.accent))
            .run(
                Run::text("insight")
                    .font(TERMINAL_FONT)
                    .size(16)
                    .color(&palette.gray3),
            )
            .into(),
        Para::new()
            .shading(&palette.bg_head)
            .borders(Borders::default().bottom(BorderLine::single(&palette.blue2, 2)))
            .spacing(60, 160)
            .indent(280, 240)
            .run(
                Run::text("$ ")
                    .font(TERMINAL_FONT)
                    .size(BOX_SIZE)
                    .color(&palette.green)
                    .bold(),
            )
            .run(
                Run::text(text)
                    .font(TERMINAL_FONT)
                    .size(BOX_SIZE)
                    .color(&palette.white),
            )
            .into(),
    ]
}

fn labelled_box(fill: &str, color: &str, label: &str, text: &str, style: &StyleContext) -> Block {
    side_bar_box(fill, color, 120)
        .run(run(label, style).bold().size(BOX_SIZE).color(color))
        .run(
            run(text, style)
                .size(BOX_SIZE)
                .color(&style.palette.dark),
        )
        .into()
}

fn tip_box(text: &str, style: &StyleContext) -> Block {
    labelled_box(
        &style.palette.bg_green,
        &style.palette.green,
        "Tip  ",
        text,
        style,
    )
}

fn warning_box(text: &str, style: &StyleContext) -> Block {
    labelled_box(
        &style.palette.bg_amber,
        &style.palette.amber,
        "Warning  ",
        text,
        style,
    )
}

fn qa_block(question: &str, answers: &[String], style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    let side = || {
        Borders::default()
            .left(BorderLine::single(&palette.box_border, 2))
            .right(BorderLine::single(&palette.box_border, 2))
    };

    let mut blocks = vec![Para::new()
        .shading(&palette.bg_head)
        .borders(Borders::default().top(BorderLine::single(&palette.blue2, 2)))
        .spacing(160, 0)
        .indent(240, 240)
        .run(run("Q  ", style).bold().size(BOX_SIZE).color(&palette.blue2))
        .run(
            run(question, style)
                .size(BOX_SIZE)
                .color(&palette.white)
                .italic(),
        )
        .into()];

    blocks.extend(answers.iter().map(|answer| {
        Para::new()
            .shading(&palette.bg_box)
            .borders(side())
            .spacing(50, 40)
            .indent(360, 240)
            .run(run(answer, style).size(BOX_SIZE).color(&palette.gray))
            .into()
    }));

    blocks.push(
        Para::new()
            .shading(&palette.bg_box)
            .borders(side().bottom(BorderLine::single(&palette.box_border, 2)))
            .spacing(0, 120)
            .into(),
    );
    blocks.push(empty(40));
    blocks
}

fn prompt_box(label: &str, text: &str, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    vec![
        Para::new()
            .shading(&palette.bg_head)
            .borders(Borders::default().top(BorderLine::single(&palette.blue2, 2)))
            .spacing(160, 0)
            .indent(240, 240)
            .run(Run::text("\u{1F511}  ").size(BOX_SIZE))
            .run(
                run("Golden Prompt  ", style)
                    .bold()
                    .size(BOX_SIZE)
                    .color(&palette.blue2),
            )
            .run(run(label, style).size(18).color(&palette.gray3))
            .into(),
        Para::new()
            .shading(&palette.bg_head)
            .borders(Borders::default().bottom(BorderLine::single(&palette.blue2, 2)))
            .spacing(60, 0)
            .indent(280, 240)
            .run(
                run(text, style)
                    .size(BOX_SIZE)
                    .color(&palette.gray3)
                    .italic(),
            )
            .into(),
        empty(60),
    ]
}

fn conclusion_box(lines: &[String], style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;

    let mut blocks = vec![Para::new()
        .shading(&palette.bg_head)
        .borders(Borders::default().top(BorderLine::thick(&palette.accent, 12)))
        .spacing(120, 0)
        .indent(240, 240)
        .into()];

    blocks.extend(lines.iter().map(|line| {
        Para::new()
            .shading(&palette.bg_head)
            .spacing(60, 60)
            .indent(280, 280)
            .run(run(line, style).size(22).color(&palette.white))
            .into()
    }));

    blocks.push(
        Para::new()
            .shading(&palette.bg_head)
            .borders(Borders::default().bottom(BorderLine::thick(&palette.accent, 8)))
            .spacing(0, 0)
            .into(),
    );
    blocks.push(empty(80));
    blocks
}

fn bullet_list(items: &[String], style: &StyleContext) -> Vec<Block> {
    items
        .iter()
        .map(|item| {
            Para::new()
                .bullet()
                .spacing(40, 80)
                .line(style.line_spacing)
                .align(body_align(style))
                .run(
                    run(item, style)
                        .size(style.sizes.body)
                        .color(&style.palette.text),
                )
                .into()
        })
        .collect()
}

fn caption(text: &str) -> Block {
    Para::new()
        .align(Align::Center)
        .spacing(30, 100)
        .run(Run::text(text).size(18).color(CAPTION_COLOR).italic())
        .into()
}

/// Boxed "[ Image ]" marker followed by the caption
fn image_placeholder(caption_text: &str) -> Vec<Block> {
    vec![
        Para::new()
            .shading(PLACEHOLDER_FILL)
            .borders(Borders::all(BorderLine::single(PLACEHOLDER_BORDER, 2)))
            .align(Align::Center)
            .spacing(100, 0)
            .indent(200, 200)
            .run(
                Run::text("[ Image ]")
                    .font(PLACEHOLDER_FONT)
                    .size(20)
                    .color(PLACEHOLDER_TEXT),
            )
            .into(),
        caption(caption_text),
    ]
}

/// Embedded picture with caption; falls back to the placeholder when the file
/// is missing or unreadable
fn image(
    image_dir: &Path,
    filename: &str,
    width_emu: u64,
    height_emu: u64,
    caption_text: &str,
) -> Vec<Block> {
    let path = image_path(image_dir, filename);
    if is_image_missing(image_dir, filename) {
        log::warn!("Image not found: {}, using placeholder", path.display());
        return image_placeholder(caption_text);
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read image {}: {}", path.display(), e);
            return image_placeholder(caption_text);
        }
    };

    let (width_emu, height_emu) = display_size(&bytes, width_emu, height_emu);
    log::debug!(
        "Embedding image {} at {}x{} EMU",
        path.display(),
        width_emu,
        height_emu
    );

    vec![
        Para::new()
            .align(Align::Center)
            .spacing(100, 0)
            .run(Run::image(ImageData {
                bytes,
                width_emu,
                height_emu,
            }))
            .into(),
        caption(caption_text),
    ]
}

/// Display size of an image in EMU
///
/// Explicit dimensions win; otherwise the pixel size is read from the image
/// header at 96 DPI; otherwise the full column width at a 2:1 ratio. The result
/// never exceeds [`MAX_IMAGE_WIDTH_EMU`] and keeps its aspect ratio.
pub fn display_size(bytes: &[u8], width_emu: u64, height_emu: u64) -> (u64, u64) {
    let (width, height) = if width_emu > 0 && height_emu > 0 {
        (width_emu, height_emu)
    } else {
        match imagesize::blob_size(bytes) {
            Ok(size) if size.width > 0 && size.height > 0 => (
                size.width as u64 * EMUS_PER_PIXEL,
                size.height as u64 * EMUS_PER_PIXEL,
            ),
            _ => (
                if width_emu > 0 {
                    width_emu
                } else {
                    MAX_IMAGE_WIDTH_EMU
                },
                if height_emu > 0 {
                    height_emu
                } else {
                    MAX_IMAGE_WIDTH_EMU / 2
                },
            ),
        }
    };

    if width > MAX_IMAGE_WIDTH_EMU {
        let scaled = (height as f64 * MAX_IMAGE_WIDTH_EMU as f64 / width as f64).round() as u64;
        (MAX_IMAGE_WIDTH_EMU, scaled)
    } else {
        (width, height)
    }
}

fn table_cell(text: &str, width: u32, fill: &str, color: &str, bold: bool) -> Cell {
    Cell {
        paragraphs: vec![Para::new().run(
            Run::text(text)
                .size(TABLE_CELL_SIZE)
                .color(color)
                .bold_if(bold),
        )],
        width: Some(width),
        fill: Some(fill.to_string()),
        borders: Borders::all(BorderLine::single(TABLE_BORDER, 2)),
        v_center: true,
    }
}

fn grid_table(column_widths: &[u32], rows: Vec<Vec<Cell>>) -> TableBlock {
    TableBlock {
        width: TableWidth::Fixed(column_widths.iter().sum()),
        column_widths: column_widths.to_vec(),
        cell_margins: TABLE_CELL_MARGINS,
        borderless: false,
        rows,
    }
}

fn stripe(row: usize) -> &'static str {
    if row % 2 == 0 {
        "FFFFFF"
    } else {
        TABLE_STRIPE
    }
}

/// Two-column key/value table; the key column is an accent label
fn table2(col1: &str, col2: &str, rows: &[Vec<String>], style: &StyleContext) -> TableBlock {
    let palette = &style.palette;
    let [w1, w2] = TABLE2_WIDTHS;

    let mut table_rows = vec![vec![
        table_cell(col1, w1, &palette.bg_head, &palette.white, true),
        table_cell(col2, w2, &palette.bg_head, &palette.white, true),
    ]];

    for (i, row) in rows.iter().enumerate() {
        let left = row.first().map(String::as_str).unwrap_or("");
        let right = row.get(1).map(String::as_str).unwrap_or("");
        let label_fill = if i % 2 == 0 {
            palette.bg_box.as_str()
        } else {
            TABLE_STRIPE
        };
        table_rows.push(vec![
            table_cell(left, w1, label_fill, &palette.accent, true),
            table_cell(right, w2, stripe(i), &palette.dark, false),
        ]);
    }

    grid_table(&TABLE2_WIDTHS, table_rows)
}

/// Three-column table; extra header values and cells beyond the third column
/// are dropped
fn table3(headers: &[String], rows: &[Vec<String>], style: &StyleContext) -> TableBlock {
    let palette = &style.palette;
    let columns = TABLE3_WIDTHS.len();

    if headers.len() > columns || rows.iter().any(|r| r.len() > columns) {
        log::debug!("table3 has more than {} columns, extra cells dropped", columns);
    }

    let mut table_rows = vec![headers
        .iter()
        .take(columns)
        .zip(TABLE3_WIDTHS)
        .map(|(header, width)| table_cell(header, width, &palette.bg_head, &palette.white, true))
        .collect::<Vec<_>>()];

    for (ri, row) in rows.iter().enumerate() {
        table_rows.push(
            row.iter()
                .take(columns)
                .zip(TABLE3_WIDTHS)
                .enumerate()
                .map(|(ci, (cell, width))| {
                    if ci == 0 {
                        table_cell(cell, width, &palette.bg_red, &palette.accent, true)
                    } else {
                        table_cell(cell, width, stripe(ri), &palette.dark, false)
                    }
                })
                .collect(),
        );
    }

    grid_table(&TABLE3_WIDTHS, table_rows)
}

fn hr(color: &str, size: u32) -> Block {
    Para::new()
        .borders(Borders::default().bottom(BorderLine::single(color, size).space(1)))
        .spacing(80, 80)
        .into()
}

/// Centred accent marker over a thin rule, with an optional part title
fn section_divider(text: &str, style: &StyleContext) -> Block {
    let palette = &style.palette;
    let mut para = Para::new()
        .align(Align::Center)
        .spacing(360, 120)
        .borders(Borders::default().bottom(BorderLine::single(&palette.rule, 4).space(8)))
        .run(run("\u{25C6}", style).size(style.sizes.body).color(&palette.accent));

    if !text.is_empty() {
        para = para.run(
            heading_run(&format!("  {}  ", text), style)
                .size(style.sizes.h3)
                .color(&palette.dark),
        );
        para = para.run(run("\u{25C6}", style).size(style.sizes.body).color(&palette.accent));
    }
    para.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_tree::Inline;
    use crate::manuscript::CustomSettings;
    use crate::style::resolve;
    use crate::theme::{TemplateKind, TemplateStyle};

    fn style_of(kind: TemplateKind) -> StyleContext {
        let template = TemplateStyle {
            kind,
            ..TemplateStyle::default()
        };
        resolve(&template, &CustomSettings::default())
    }

    fn style() -> StyleContext {
        style_of(TemplateKind::Business)
    }

    fn no_images() -> PathBuf {
        std::env::temp_dir().join("docstyle-renderer-no-images")
    }

    fn paragraph(block: &Block) -> &Para {
        block.as_paragraph().expect("paragraph block")
    }

    fn table(block: &Block) -> &TableBlock {
        match block {
            Block::Table(table) => table,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_h1_with_number() {
        let blocks = render_element(&Element::heading(1, "3", "Setup"), &style(), &no_images());

        assert_eq!(blocks.len(), 2);
        let para = paragraph(&blocks[0]);
        assert_eq!(para.text(), "3.  Setup");
        assert_eq!(para.heading_level, Some(1));
        assert_eq!(para.runs[0].color.as_deref(), Some("DC2626"));
        assert_eq!(para.runs[1].size, Some(32));
        assert_eq!(paragraph(&blocks[1]), &Para::spacer(40));
    }

    #[test]
    fn test_h1_without_number() {
        let blocks = render_element(&Element::heading(1, "", "Setup"), &style(), &no_images());
        assert_eq!(paragraph(&blocks[0]).text(), "Setup");
    }

    #[test]
    fn test_body_uses_style() {
        let mut style = style();
        style.justify = true;

        let blocks = render_element(
            &Element::Body {
                text: "Text".to_string(),
                indent: 400,
            },
            &style,
            &no_images(),
        );

        let para = paragraph(&blocks[0]);
        assert_eq!(para.align, Some(Align::Justify));
        assert_eq!(para.indent.map(|i| i.left), Some(400));
        assert_eq!(para.spacing.and_then(|s| s.line), Some(384));
        assert_eq!(para.runs[0].size, Some(20));
    }

    #[test]
    fn test_insight_switches_to_terminal_for_tech() {
        let insight = Element::Insight {
            text: "Measure first".to_string(),
        };

        let standard = render_element(&insight, &style(), &no_images());
        assert_eq!(standard.len(), 2);
        assert!(paragraph(&standard[0]).runs[0].bold);

        let tech = render_element(&insight, &style_of(TemplateKind::Tech), &no_images());
        assert_eq!(tech.len(), 3);
        let prompt_line = paragraph(&tech[1]);
        assert_eq!(prompt_line.text(), "$ Measure first");
        assert_eq!(prompt_line.runs[1].font.as_deref(), Some(TERMINAL_FONT));
    }

    #[test]
    fn test_missing_image_matches_placeholder() {
        let image = Element::Image {
            filename: "nope.png".to_string(),
            width_emu: 100,
            height_emu: 100,
            caption: "Figure 1".to_string(),
        };
        let placeholder = Element::ImagePlaceholder {
            caption: "Figure 1".to_string(),
        };

        assert_eq!(
            render_element(&image, &style(), &no_images()),
            render_element(&placeholder, &style(), &no_images())
        );
    }

    #[test]
    fn test_image_without_file_name_is_missing() {
        assert!(is_image_missing(&std::env::temp_dir(), ""));
    }

    #[test]
    fn test_image_is_embedded_and_scaled() {
        let dir = std::env::temp_dir().join("docstyle-renderer-images");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pic.bin"), b"not really an image").unwrap();

        let blocks = render_element(
            &Element::Image {
                filename: "pic.bin".to_string(),
                width_emu: 12_192_000,
                height_emu: 4_000_000,
                caption: "Wide".to_string(),
            },
            &style(),
            &dir,
        );

        assert_eq!(blocks.len(), 3);
        match &paragraph(&blocks[0]).runs[0].content {
            Inline::Image(image) => {
                assert_eq!(image.width_emu, MAX_IMAGE_WIDTH_EMU);
                assert_eq!(image.height_emu, 2_000_000);
            }
            other => panic!("expected image run, got {:?}", other),
        }
        assert_eq!(paragraph(&blocks[1]).text(), "Wide");
    }

    #[test]
    fn test_display_size_fallback() {
        assert_eq!(
            display_size(b"", 0, 0),
            (MAX_IMAGE_WIDTH_EMU, MAX_IMAGE_WIDTH_EMU / 2)
        );
        assert_eq!(display_size(b"", 1000, 0), (1000, MAX_IMAGE_WIDTH_EMU / 2));
        assert_eq!(display_size(b"", 2000, 1000), (2000, 1000));
    }

    #[test]
    fn test_table3_truncates_to_three_columns() {
        let element = Element::Table3 {
            headers: vec!["A", "B", "C", "D"].into_iter().map(String::from).collect(),
            rows: vec![vec!["1", "2", "3", "4"].into_iter().map(String::from).collect()],
        };

        let blocks = render_element(&element, &style(), &no_images());
        let table = table(&blocks[0]);

        assert_eq!(table.column_widths, TABLE3_WIDTHS.to_vec());
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(table.rows[0][2].paragraphs[0].text(), "C");
        assert_eq!(table.rows[1][0].fill.as_deref(), Some("FEF2F2"));
        assert!(table.rows[1][0].paragraphs[0].runs[0].bold);
        assert!(!table.rows[1][1].paragraphs[0].runs[0].bold);
    }

    #[test]
    fn test_table2_alternates_rows() {
        let rows = vec![
            vec!["k1".to_string(), "v1".to_string()],
            vec!["k2".to_string()],
        ];
        let blocks = render_element(
            &Element::Table2 {
                col1: "Key".to_string(),
                col2: "Value".to_string(),
                rows,
            },
            &style(),
            &no_images(),
        );
        let table = table(&blocks[0]);

        assert_eq!(table.width, TableWidth::Fixed(9026));
        assert_eq!(table.rows[0][0].fill.as_deref(), Some("1E293B"));
        assert_eq!(table.rows[1][1].fill.as_deref(), Some("FFFFFF"));
        assert_eq!(table.rows[2][1].fill.as_deref(), Some(TABLE_STRIPE));
        assert_eq!(table.rows[2][1].paragraphs[0].text(), "");
        assert_eq!(paragraph(&blocks[1]), &Para::spacer(60));
    }

    #[test]
    fn test_unknown_kind() {
        let with_text = Element::Unknown {
            kind: "callout".to_string(),
            text: Some("Hello".to_string()),
        };
        let blocks = render_element(&with_text, &style(), &no_images());
        assert_eq!(blocks.len(), 1);
        assert_eq!(paragraph(&blocks[0]).text(), "Hello");

        let without_text = Element::Unknown {
            kind: "callout".to_string(),
            text: None,
        };
        assert!(render_element(&without_text, &style(), &no_images()).is_empty());
    }

    #[test]
    fn test_minimal_chapter_title() {
        let element = Element::ChapterTitle {
            phase: "Part 1".to_string(),
            text: "Beginnings".to_string(),
            sub: "Where it starts".to_string(),
        };

        let minimal = render_element(&element, &style_of(TemplateKind::Minimal), &no_images());
        assert_eq!(minimal.len(), 4);
        assert_eq!(paragraph(&minimal[1]).align, Some(Align::Center));
        assert_eq!(paragraph(&minimal[1]).runs[0].size, Some(48));

        let banded = render_element(&element, &style(), &no_images());
        assert_eq!(banded.len(), 4);
        assert_eq!(paragraph(&banded[0]).text(), "Part 1");
        assert_eq!(paragraph(&banded[1]).shading.as_deref(), Some("1E293B"));
    }

    #[test]
    fn test_bullets_share_numbering() {
        let blocks = render_element(
            &Element::Bullets {
                items: vec!["one".to_string(), "two".to_string()],
            },
            &style(),
            &no_images(),
        );
        assert_eq!(blocks.len(), 3);
        assert!(paragraph(&blocks[0]).bullet);
        assert!(paragraph(&blocks[1]).bullet);
        assert!(!paragraph(&blocks[2]).bullet);
    }

    #[test]
    fn test_qa_block_shape() {
        let blocks = render_element(
            &Element::Qa {
                question: "Why?".to_string(),
                answers: vec!["A".to_string(), "B".to_string()],
            },
            &style(),
            &no_images(),
        );
        // header, two answers, closing line, spacer
        assert_eq!(blocks.len(), 5);
        assert_eq!(paragraph(&blocks[0]).text(), "Q  Why?");
        assert_eq!(paragraph(&blocks[4]), &Para::spacer(40));
    }

    #[test]
    fn test_empty_height() {
        let blocks = render_element(&Element::Empty { height: 300 }, &style(), &no_images());
        assert_eq!(blocks, vec![empty(300)]);
    }
}
