//! Document assembler
//!
//! Wraps rendered elements into a complete [`DocumentTree`]: optional cover and
//! table of contents, the shared header and footer bands, page margins and the
//! section layout. Editorial templates get two sections: a continuous
//! single-column opener that runs up to and including the first chapter title,
//! then a two-column body.

use crate::document_tree::{
    Align, Block, BorderLine, Borders, BulletStyle, Cell, CellMargins, DocDefaults, DocumentTree,
    Margins, PageSection, PageSetup, Para, Run, SectionStart, TableBlock, TableWidth, A4_HEIGHT,
    A4_WIDTH,
};
use crate::manuscript::{DocumentMeta, ElementKind};
use crate::renderer::empty;
use crate::style::{MarginProfile, StyleContext};

/// Bullet glyph shared by every list
pub const BULLET_SYMBOL: &str = "\u{25B8}";

/// Gap between the two editorial columns in twips
pub const EDITORIAL_COLUMN_SPACE: u32 = 720;

const TOC_TITLE: &str = "Contents";
const COPYRIGHT_NOTICE: &str = "This manuscript is protected by copyright law";

/// The blocks one element rendered to, tagged with its kind
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedElement {
    pub kind: ElementKind,
    pub blocks: Vec<Block>,
}

/// Assemble the final document
///
/// # Parameters
/// * `style` - Resolved style of this render
/// * `meta` - Document metadata (cover, header, footer, TOC switch)
/// * `rendered` - Rendered elements in document order
///
/// # Returns
/// * `DocumentTree` - The complete document, ready for a backend
pub fn assemble(
    style: &StyleContext,
    meta: &DocumentMeta,
    rendered: Vec<RenderedElement>,
) -> DocumentTree {
    let mut front = Vec::new();
    if meta.has_cover() {
        front.extend(cover_page(meta, style));
    }
    if meta.auto_toc {
        front.extend(table_of_contents(style));
    }

    // Opening blocks, then the body; only editorial layouts split them
    let mut opening = vec![empty(100)];
    let mut body = Vec::new();
    let mut reached_chapter_body = false;

    for element in rendered {
        if style.is_editorial() && !reached_chapter_body {
            opening.extend(element.blocks);
            if element.kind == ElementKind::ChapterTitle {
                reached_chapter_body = true;
            }
        } else if style.is_editorial() {
            body.extend(element.blocks);
        } else {
            opening.extend(element.blocks);
        }
    }
    body.push(empty(200));

    let sections = if style.is_editorial() {
        front.extend(opening);
        vec![
            PageSection::single_column(SectionStart::Continuous, front),
            PageSection {
                start: SectionStart::Continuous,
                columns: 2,
                column_space: EDITORIAL_COLUMN_SPACE,
                blocks: body,
            },
        ]
    } else {
        front.extend(opening);
        front.extend(body);
        vec![PageSection::single_column(SectionStart::NewPage, front)]
    };

    log::debug!(
        "Assembled {} section(s) for '{}'",
        sections.len(),
        style.name
    );

    DocumentTree {
        page: PageSetup {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margins: page_margins(style),
        },
        defaults: DocDefaults {
            font: style.body_font.clone(),
            size: style.sizes.body,
            color: style.palette.text.clone(),
            align: default_align(style),
        },
        bullets: BulletStyle {
            symbol: BULLET_SYMBOL.to_string(),
            indent_left: 480,
            hanging: 240,
            font: style.body_font.clone(),
            color: style.palette.blue2.clone(),
        },
        header: header_band(meta, style),
        footer: footer_band(meta, style),
        sections,
    }
}

/// Page margins: an explicit wide/narrow profile wins, otherwise the template
/// kind decides
pub fn page_margins(style: &StyleContext) -> Margins {
    match style.margins {
        MarginProfile::Wide => Margins::uniform(2160),
        MarginProfile::Narrow => Margins::uniform(1080),
        MarginProfile::Template if style.is_minimal() => Margins {
            top: 1800,
            right: 2000,
            bottom: 1800,
            left: 2000,
        },
        MarginProfile::Template if style.is_editorial() => Margins {
            top: 1080,
            right: 1080,
            bottom: 1440,
            left: 1080,
        },
        MarginProfile::Template => Margins {
            top: 1260,
            right: 1260,
            bottom: 1260,
            left: 1440,
        },
    }
}

fn default_align(style: &StyleContext) -> Align {
    if style.is_minimal() {
        Align::Center
    } else if style.justify {
        Align::Justify
    } else {
        Align::Left
    }
}

/// Centred title block ending in a page break
fn cover_page(meta: &DocumentMeta, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    let mut paragraphs = Vec::new();

    if !meta.title.is_empty() {
        paragraphs.push(
            Para::new()
                .align(Align::Center)
                .spacing(0, 240)
                .run(
                    Run::text(&meta.title)
                        .font(&style.heading_font)
                        .bold()
                        .size(56)
                        .color(&palette.dark),
                ),
        );
    }
    if !meta.subtitle.is_empty() {
        paragraphs.push(
            Para::new().align(Align::Center).spacing(0, 800).run(
                Run::text(&meta.subtitle)
                    .font(&style.body_font)
                    .size(28)
                    .color(&palette.gray)
                    .italic(),
            ),
        );
    }
    if !meta.author.is_empty() {
        paragraphs.push(
            Para::new().align(Align::Center).spacing(800, 0).run(
                Run::text(&meta.author)
                    .font(&style.body_font)
                    .size(24)
                    .color(&palette.gray3),
            ),
        );
    }

    if let Some(last) = paragraphs.pop() {
        paragraphs.push(last.run(Run::page_break()));
    }

    std::iter::once(empty(1200))
        .chain(paragraphs.into_iter().map(Block::from))
        .collect()
}

fn table_of_contents(style: &StyleContext) -> Vec<Block> {
    vec![
        Para::new()
            .align(Align::Center)
            .spacing(240, 240)
            .run(
                Run::text(TOC_TITLE)
                    .font(&style.body_font)
                    .size(36)
                    .bold()
                    .color(&style.palette.dark),
            )
            .into(),
        Block::TableOfContents { max_level: 3 },
        empty(200),
        Para::new().run(Run::page_break()).into(),
    ]
}

/// Full-width single-cell bar
fn bar(fill: &str, margins: CellMargins, paragraphs: Vec<Para>) -> Block {
    TableBlock {
        width: TableWidth::Percent(100),
        column_widths: Vec::new(),
        cell_margins: margins,
        borderless: true,
        rows: vec![vec![Cell {
            paragraphs,
            width: None,
            fill: Some(fill.to_string()),
            borders: Borders::default(),
            v_center: false,
        }]],
    }
    .into()
}

/// Shaded bar above a ruled line with the title (or header text) and chapter
fn header_band(meta: &DocumentMeta, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    let (left, right) = if meta.header_text.is_empty() {
        (format!("{}    ", meta.title), meta.chapter.clone())
    } else {
        (meta.header_text.clone(), String::new())
    };

    let mark = |text: &str| {
        Run::text(text)
            .font(&style.body_font)
            .size(16)
            .color(&palette.white)
            .bold()
    };
    let top_bar = bar(
        &palette.bg_head,
        CellMargins {
            top: 120,
            bottom: 120,
            left: 260,
            right: 260,
        },
        vec![
            Para::new().spacing(0, 40).run(mark("__________")),
            Para::new().spacing(0, 0).run(mark("____")),
        ],
    );

    let title_line = Para::new()
        .borders(Borders::default().bottom(BorderLine::single(&palette.rule, 4).space(2)))
        .spacing(40, 100)
        .run(
            Run::text(left)
                .font(&style.body_font)
                .size(18)
                .color(&palette.gray3),
        )
        .run(
            Run::text(right)
                .font(&style.body_font)
                .size(18)
                .color(&palette.blue)
                .bold(),
        );

    vec![top_bar, title_line.into()]
}

/// Page number, copyright line and accent bar
fn footer_band(meta: &DocumentMeta, style: &StyleContext) -> Vec<Block> {
    let palette = &style.palette;
    let show_page_numbers = meta.show_page_numbers();
    let top_rule = || Borders::default().top(BorderLine::single(&palette.rule, 4).space(2));
    let mut blocks = Vec::new();

    if show_page_numbers {
        let styled = |run: Run| run.font(&style.body_font).size(18).color(&palette.dark);
        blocks.push(
            Para::new()
                .borders(top_rule())
                .align(Align::Center)
                .spacing(100, 0)
                .run(styled(Run::text("-  ")))
                .run(styled(Run::page_number()))
                .run(styled(Run::text("  -")))
                .into(),
        );
    }

    let mut copyright = Para::new()
        .align(Align::Right)
        .spacing(if show_page_numbers { 40 } else { 100 }, 0)
        .run(
            Run::text(format!("\u{A9} {}  |  {}", meta.author, COPYRIGHT_NOTICE))
                .font(&style.body_font)
                .size(18)
                .color(&palette.gray3),
        );
    if !show_page_numbers {
        copyright = copyright.borders(top_rule());
    }
    blocks.push(copyright.into());

    blocks.push(bar(
        &palette.accent,
        CellMargins {
            top: 80,
            bottom: 80,
            left: 0,
            right: 0,
        },
        vec![Para::new().run(Run::text(" ").size(2).color(&palette.accent))],
    ));

    blocks
}
