//! Structured Markdown manuscripts
//!
//! Authors who do not want to write JSON can mark up a plain Markdown file:
//!
//! ```text
//! ---
//! title: The Data Never Lies
//! author: Park
//! chapter: "[Phase 9]"
//! sub: Legal documents
//! ---
//!
//! [chapter_title]
//!
//! # 1. Getting started
//! Plain lines are body paragraphs.
//! - bullets on consecutive lines
//! - form one list
//!
//! [tip]
//! Tagged blocks run until the next blank line.
//!
//! [table2 | Key | Value]
//! a | b
//! ```
//!
//! Tags are `[name]` or `[name | param | ...]` on a line of their own. Unknown
//! tags degrade to body text. Image files are not checked here; the renderer
//! falls back to a placeholder when one is missing.

use crate::manuscript::{DocumentMeta, Element, Manuscript};
use regex::Regex;
use std::sync::LazyLock;

/// Front matter between two `---` lines at the very top
static FRONT_MATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").unwrap());

/// `[tag]` or `[tag | a | b]`
static TAG_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]|]+)(?:\s*\|\s*([^\]]*))?\]\s*$").unwrap());

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.+)$").unwrap());
static H2_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+(.+)$").unwrap());
static H3_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^###\s+(.+)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+(.+)$").unwrap());
static HR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---+\s*$").unwrap());

/// `1. Title` splits into number and title
static H1_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").unwrap());

/// Number shown for level-1 headings written without one
const UNNUMBERED_H1: &str = "\u{2022}";

/// Tags that never carry content lines
const STANDALONE_TAGS: [&str; 4] = ["chapter_title", "hr", "empty", "section_divider"];

/// Front matter fields
#[derive(Debug, Default)]
struct FrontMatter {
    meta: DocumentMeta,
    /// Chapter subtitle used by `[chapter_title]`
    sub: String,
}

/// A tagged run of lines
#[derive(Debug)]
struct RawBlock {
    tag: String,
    params: Vec<String>,
    lines: Vec<String>,
}

impl RawBlock {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            params: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn is_body(&self) -> bool {
        self.tag == "body"
    }

    fn has_content(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }

    /// Joined text, trimmed
    fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }

    /// Non-empty lines, trimmed
    fn content_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    fn param(&self, index: usize) -> String {
        self.params.get(index).cloned().unwrap_or_default()
    }
}

/// Parse a structured Markdown manuscript
///
/// # Parameters
/// * `content` - The Markdown source
///
/// # Returns
/// * `Manuscript` - Metadata from the front matter and the parsed elements;
///   settings are left empty and `image_base_dir` unset
pub fn parse(content: &str) -> Manuscript {
    let (front, body) = split_front_matter(content);

    let elements: Vec<Element> = tokenize(body)
        .iter()
        .flat_map(|block| convert_block(block, &front))
        .collect();

    log::debug!("Parsed {} elements from Markdown", elements.len());

    Manuscript {
        meta: front.meta,
        elements,
        ..Manuscript::default()
    }
}

fn split_front_matter(content: &str) -> (FrontMatter, &str) {
    let mut front = FrontMatter::default();
    let Some(captures) = FRONT_MATTER_RE.captures(content) else {
        return (front, content);
    };

    let header = captures.get(1).map_or("", |m| m.as_str());
    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key.trim().to_lowercase().as_str() {
            "title" => front.meta.title = value,
            "subtitle" => front.meta.subtitle = value,
            "author" => front.meta.author = value,
            "chapter" => front.meta.chapter = value,
            "sub" => front.sub = value,
            other => log::debug!("Ignoring front matter key '{}'", other),
        }
    }

    let end = captures.get(0).map_or(0, |m| m.end());
    (front, &content[end..])
}

/// Split the body into blocks: tags and headings start a new block, a blank
/// line ends a tagged block that already has content
fn tokenize(body: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut current = RawBlock::new("body");

    fn close(blocks: &mut Vec<RawBlock>, current: &mut RawBlock) {
        let finished = std::mem::replace(current, RawBlock::new("body"));
        if !finished.is_body() || finished.has_content() {
            blocks.push(finished);
        }
    }

    for raw_line in body.lines() {
        let line = raw_line.trim_end();

        if let Some(captures) = TAG_LINE_RE.captures(line) {
            close(&mut blocks, &mut current);
            let tag = captures[1].trim().to_lowercase();
            current = RawBlock::new(&tag);
            current.params = captures
                .get(2)
                .map(|m| m.as_str().split('|').map(|p| p.trim().to_string()).collect())
                .unwrap_or_default();
            if STANDALONE_TAGS.contains(&tag.as_str()) {
                close(&mut blocks, &mut current);
            }
            continue;
        }

        let heading = [("h1", &*H1_RE), ("h2", &*H2_RE), ("h3", &*H3_RE)]
            .into_iter()
            .find_map(|(tag, re)| re.captures(line).map(|c| (tag, c[1].trim().to_string())));
        if let Some((tag, text)) = heading {
            close(&mut blocks, &mut current);
            let mut block = RawBlock::new(tag);
            block.lines.push(text);
            blocks.push(block);
            continue;
        }

        if current.is_body() && HR_RE.is_match(line) {
            close(&mut blocks, &mut current);
            blocks.push(RawBlock::new("hr"));
            continue;
        }

        if line.trim().is_empty() && !current.is_body() && current.has_content() {
            close(&mut blocks, &mut current);
            continue;
        }

        current.lines.push(line.to_string());
    }

    close(&mut blocks, &mut current);
    blocks
}

fn convert_block(block: &RawBlock, front: &FrontMatter) -> Vec<Element> {
    let text = block.text();

    let element = match block.tag.as_str() {
        "chapter_title" => Element::ChapterTitle {
            phase: front.meta.chapter.clone(),
            text: front.meta.title.clone(),
            sub: front.sub.clone(),
        },
        "h1" => match H1_NUM_RE.captures(&text) {
            Some(captures) => Element::heading(1, &captures[1], &captures[2]),
            None => Element::heading(1, UNNUMBERED_H1, text),
        },
        "h2" => Element::heading(2, "", text),
        "h3" => Element::heading(3, "", text),
        "lead" => Element::Lead { text },
        "quote" => Element::Quote { text },
        "insight" => Element::Insight { text },
        "tip" => Element::Tip { text },
        "warning" => Element::Warning { text },
        "conclusion" => Element::Conclusion {
            lines: block.content_lines(),
        },
        "qa" => qa(block),
        "prompt" => Element::Prompt {
            label: block.param(0),
            text,
        },
        "image" => {
            let caption = block.param(0);
            match block.content_lines().into_iter().next() {
                Some(filename) => Element::Image {
                    filename,
                    width_emu: 0,
                    height_emu: 0,
                    caption,
                },
                None => Element::ImagePlaceholder { caption },
            }
        }
        "table2" => Element::Table2 {
            col1: block.param(0),
            col2: block.param(1),
            rows: table_rows(block, 2),
        },
        "table3" => Element::Table3 {
            headers: block.params.iter().take(3).cloned().collect(),
            rows: table_rows(block, 3),
        },
        "hr" => Element::Hr { size: 4 },
        "empty" => Element::Empty { height: 120 },
        "section_divider" => Element::SectionDivider {
            text: if block.params.is_empty() {
                text
            } else {
                block.param(0)
            },
        },
        "body" => return body_elements(block),
        other => {
            log::warn!("Unknown tag [{}], treating its text as body", other);
            if text.is_empty() {
                return Vec::new();
            }
            Element::body(text)
        }
    };

    vec![element]
}

/// `Q:` and `A:` lines (full-width colon accepted)
fn qa(block: &RawBlock) -> Element {
    let mut question = String::new();
    let mut answers = Vec::new();

    for line in block.content_lines() {
        if let Some(rest) = strip_marker(&line, 'Q') {
            question = rest;
        } else if let Some(rest) = strip_marker(&line, 'A') {
            answers.push(rest);
        }
    }

    Element::Qa { question, answers }
}

fn strip_marker(line: &str, marker: char) -> Option<String> {
    let rest = line.strip_prefix(marker)?;
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('\u{FF1A}'))?;
    Some(rest.trim().to_string())
}

/// Rows of `a | b | c`; lines with too few cells are skipped
fn table_rows(block: &RawBlock, columns: usize) -> Vec<Vec<String>> {
    block
        .content_lines()
        .iter()
        .map(|line| line.split('|').map(|c| c.trim().to_string()).collect::<Vec<_>>())
        .filter(|cells| cells.len() >= columns)
        .map(|cells| cells.into_iter().take(columns).collect())
        .collect()
}

/// Untagged lines: each line is a paragraph, consecutive bullets form one list
fn body_elements(block: &RawBlock) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut bullets: Vec<String> = Vec::new();

    for line in &block.lines {
        if let Some(captures) = BULLET_RE.captures(line) {
            bullets.push(captures[1].trim().to_string());
            continue;
        }
        if !bullets.is_empty() {
            elements.push(Element::Bullets {
                items: std::mem::take(&mut bullets),
            });
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            elements.push(Element::body(trimmed));
        }
    }

    if !bullets.is_empty() {
        elements.push(Element::Bullets { items: bullets });
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
title: "The Data Never Lies"
author: Park
chapter: [Phase 9]
sub: Legal documents
---

[chapter_title]

# 1. Getting started
First paragraph.
Second paragraph.

- one
- two

[insight]
Data beats opinion.

After the box.

## Details
### Finer
[qa]
Q: Why?
A: Because.
A：Full-width colon.

[table3 | A | B | C | D]
1 | 2 | 3 | 4
too | short

---
[image | Figure 1]
chart.png
"#;

    fn parsed() -> Manuscript {
        parse(SAMPLE)
    }

    #[test]
    fn test_front_matter() {
        let manuscript = parsed();
        assert_eq!(manuscript.meta.title, "The Data Never Lies");
        assert_eq!(manuscript.meta.author, "Park");
        assert_eq!(manuscript.meta.chapter, "[Phase 9]");
        assert_eq!(
            manuscript.elements[0],
            Element::ChapterTitle {
                phase: "[Phase 9]".to_string(),
                text: "The Data Never Lies".to_string(),
                sub: "Legal documents".to_string(),
            }
        );
    }

    #[test]
    fn test_headings_and_body() {
        let elements = parsed().elements;
        assert_eq!(elements[1], Element::heading(1, "1", "Getting started"));
        assert_eq!(elements[2], Element::body("First paragraph."));
        assert_eq!(elements[3], Element::body("Second paragraph."));
        assert_eq!(
            elements[4],
            Element::Bullets {
                items: vec!["one".to_string(), "two".to_string()]
            }
        );
    }

    #[test]
    fn test_tagged_block_ends_at_blank_line() {
        let elements = parsed().elements;
        assert_eq!(
            elements[5],
            Element::Insight {
                text: "Data beats opinion.".to_string()
            }
        );
        assert_eq!(elements[6], Element::body("After the box."));
        assert_eq!(elements[7], Element::heading(2, "", "Details"));
        assert_eq!(elements[8], Element::heading(3, "", "Finer"));
    }

    #[test]
    fn test_qa_and_tables() {
        let elements = parsed().elements;
        assert_eq!(
            elements[9],
            Element::Qa {
                question: "Why?".to_string(),
                answers: vec!["Because.".to_string(), "Full-width colon.".to_string()],
            }
        );
        assert_eq!(
            elements[10],
            Element::Table3 {
                headers: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                rows: vec![vec!["1".to_string(), "2".to_string(), "3".to_string()]],
            }
        );
    }

    #[test]
    fn test_rule_and_image() {
        let elements = parsed().elements;
        assert_eq!(elements[11], Element::Hr { size: 4 });
        assert_eq!(
            elements[12],
            Element::Image {
                filename: "chart.png".to_string(),
                width_emu: 0,
                height_emu: 0,
                caption: "Figure 1".to_string(),
            }
        );
        assert_eq!(elements.len(), 13);
    }

    #[test]
    fn test_unnumbered_h1() {
        let manuscript = parse("# Preface\n");
        assert_eq!(
            manuscript.elements,
            vec![Element::heading(1, UNNUMBERED_H1, "Preface")]
        );
    }

    #[test]
    fn test_unknown_tag_degrades_to_body() {
        let manuscript = parse("[callout]\nSome text\n\n[mystery]\n");
        assert_eq!(manuscript.elements, vec![Element::body("Some text")]);
    }

    #[test]
    fn test_no_front_matter() {
        let manuscript = parse("Just text\n");
        assert_eq!(manuscript.meta, DocumentMeta::default());
        assert_eq!(manuscript.elements, vec![Element::body("Just text")]);
    }

    #[test]
    fn test_section_divider_and_prompt() {
        let manuscript = parse("[section_divider | Part Two]\n[prompt | Summary]\nSummarise this.\n");
        assert_eq!(
            manuscript.elements,
            vec![
                Element::SectionDivider {
                    text: "Part Two".to_string()
                },
                Element::Prompt {
                    label: "Summary".to_string(),
                    text: "Summarise this.".to_string()
                },
            ]
        );
    }
}
