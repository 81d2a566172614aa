use docstyle::auto_polish::PolishLevel;
use docstyle::document_tree::{Block, SectionStart};
use docstyle::manuscript::{CustomSettings, DocumentMeta, Element, ElementKind, Manuscript};
use docstyle::pipeline::{build, build_to_file, convert_json, prepare_elements};
use docstyle::theme::ThemeRegistry;
use std::io::Read;
use std::path::{Path, PathBuf};

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("docstyle-build-test");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn read_package_part(package: &Path, part: &str) -> String {
    let file = std::fs::File::open(package).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(part).unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

/// Over 600 characters in 12 sentences
fn long_paragraph() -> String {
    (1..=12)
        .map(|n| format!("Sentence number {:02} keeps the introduction going on.", n))
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_heavy_manuscript() -> Manuscript {
    Manuscript {
        meta: DocumentMeta {
            title: "T".to_string(),
            ..DocumentMeta::default()
        },
        custom_settings: CustomSettings {
            auto_polish: Some(true),
            auto_polish_level: Some("normal".to_string()),
            ..CustomSettings::default()
        },
        elements: vec![
            Element::heading(1, "1", "Intro"),
            Element::body(long_paragraph()),
            Element::body("A short follow-up."),
            Element::heading(2, "", "Background"),
            Element::body("Short."),
            Element::body("Also short."),
        ],
        ..Manuscript::default()
    }
}

#[test]
fn test_long_body_after_heading_becomes_lead_and_body() {
    let manuscript = text_heavy_manuscript();
    assert!(long_paragraph().chars().count() >= 600);

    let outcome = prepare_elements(&manuscript.elements, &manuscript.custom_settings);
    assert!(outcome.polished);

    let kinds: Vec<ElementKind> = outcome.elements.iter().map(Element::kind).collect();
    assert_eq!(
        &kinds[..3],
        &[ElementKind::H1, ElementKind::Lead, ElementKind::Body]
    );

    let (lead, remainder) = match (&outcome.elements[1], &outcome.elements[2]) {
        (Element::Lead { text: lead }, Element::Body { text: body, .. }) => (lead, body),
        other => panic!("unexpected elements {:?}", other),
    };
    assert!(lead.starts_with("Sentence number 01"));
    assert!(remainder.ends_with("Sentence number 12 keeps the introduction going on."));
    assert_eq!(format!("{} {}", lead, remainder), long_paragraph());
}

#[test]
fn test_rendered_lead_follows_heading() {
    let registry = ThemeRegistry::bundled().unwrap();
    let output = build(&text_heavy_manuscript(), registry.get("01").unwrap());

    let texts: Vec<String> = output.tree.paragraphs().map(|p| p.text()).collect();
    let heading = texts.iter().position(|t| t == "1.  Intro").unwrap();
    let lead = texts
        .iter()
        .position(|t| t.starts_with("Sentence number 01"))
        .unwrap();
    let body = texts
        .iter()
        .position(|t| t.ends_with("Sentence number 12 keeps the introduction going on."))
        .unwrap();

    assert!(heading < lead && lead < body);
    assert!(texts[heading + 1..lead].iter().all(String::is_empty));
    assert!(output.report.polish.polished);
    assert_eq!(output.report.polish.level, PolishLevel::Normal);
    assert_eq!(output.report.element_count, 7);
}

#[test]
fn test_editorial_template_uses_two_column_body() {
    let registry = ThemeRegistry::bundled().unwrap();
    let output = build(&text_heavy_manuscript(), registry.get("01").unwrap());

    let sections = &output.tree.sections;
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].columns, 1);
    assert_eq!(sections[1].columns, 2);
    assert_eq!(sections[1].start, SectionStart::Continuous);
}

#[test]
fn test_business_template_uses_single_section() {
    let registry = ThemeRegistry::bundled().unwrap();
    let output = build(&text_heavy_manuscript(), registry.get("11").unwrap());

    assert_eq!(output.tree.sections.len(), 1);
    assert_eq!(output.tree.sections[0].columns, 1);
}

#[test]
fn test_polish_off_keeps_sequence() {
    let mut manuscript = text_heavy_manuscript();
    manuscript.custom_settings.auto_polish = Some(false);

    let registry = ThemeRegistry::bundled().unwrap();
    let output = build(&manuscript, registry.get("01").unwrap());

    assert!(!output.report.polish.polished);
    assert_eq!(output.report.polish.classification, None);
    assert_eq!(output.report.element_count, 6);
    assert!(output
        .tree
        .paragraphs()
        .any(|p| p.text() == long_paragraph()));
}

#[test]
fn test_write_docx_with_every_element_kind() {
    let json = r#"{
        "meta": {"title": "Field Guide", "author": "Lee", "chapter": "Part 1", "auto_toc": true},
        "custom_settings": {"style_preset": "report", "base_size": "22", "margins": "narrow"},
        "image_base_dir": "/nonexistent/images",
        "elements": [
            {"type": "chapter_title", "phase": "Part 1", "text": "Basics", "sub": "Start here"},
            {"type": "h1", "num": "1", "text": "Overview"},
            {"type": "lead", "text": "Opening words."},
            {"type": "body", "text": "Body text.", "indent": 240},
            {"type": "h2", "text": "Details"},
            {"type": "h3", "text": "Finer"},
            {"type": "quote", "text": "Quoted."},
            {"type": "insight", "text": "Insight."},
            {"type": "tip", "text": "Tip."},
            {"type": "warning", "text": "Careful."},
            {"type": "qa", "question": "Why?", "answers": ["Because."]},
            {"type": "prompt", "label": "Ask", "text": "Summarise."},
            {"type": "conclusion", "lines": ["One", "Two"]},
            {"type": "bullets", "items": ["a", "b"]},
            {"type": "image", "filename": "missing.png", "caption": "Figure"},
            {"type": "image_placeholder", "caption": "Later"},
            {"type": "table2", "col1": "Key", "col2": "Value", "rows": [["k", "v"]]},
            {"type": "table3", "headers": ["A", "B", "C"], "rows": [["1", "2", "3", "4"]]},
            {"type": "hr", "size": 4},
            {"type": "section_divider", "text": "Next"},
            {"type": "empty", "height": 120},
            {"type": "callout", "text": "Unknown kinds degrade to body."}
        ]
    }"#;

    let registry = ThemeRegistry::bundled().unwrap();
    for template in ["01", "02", "11", "25"] {
        let output = temp_path(&format!("every-kind-{}.docx", template));
        let report = convert_json(json, &registry, template, &output).unwrap();

        assert_eq!(report.element_count, 22);
        assert_eq!(report.image_count, 0);
        assert_eq!(report.missing_images.len(), 1);

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}

#[test]
fn test_build_to_file_with_markdown_source() {
    let source = temp_path("guide.md");
    std::fs::write(
        &source,
        "---\ntitle: Guide\nauthor: Kim\n---\n# 1. Start\nHello there.\n\n[tip]\nSave often.\n",
    )
    .unwrap();

    let manuscript = Manuscript::load(&source).unwrap();
    assert_eq!(manuscript.meta.title, "Guide");
    assert_eq!(manuscript.image_base_dir.as_deref(), source.parent());
    assert_eq!(manuscript.elements.len(), 3);

    let registry = ThemeRegistry::bundled().unwrap();
    let output = temp_path("guide.docx");
    let report = build_to_file(&manuscript, registry.get("21").unwrap(), &output).unwrap();

    assert_eq!(report.element_count, 3);
    assert!(output.is_file());
}

#[test]
fn test_table_blocks_are_emitted() {
    let manuscript = Manuscript {
        elements: vec![Element::Table3 {
            headers: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows: vec![vec!["1".to_string(), "2".to_string(), "3".to_string()]],
        }],
        ..Manuscript::default()
    };

    let registry = ThemeRegistry::bundled().unwrap();
    let output = build(&manuscript, registry.get("11").unwrap());

    let tables: Vec<_> = output
        .tree
        .blocks()
        .filter_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
        .filter(|t| !t.borderless)
        .collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows.len(), 2);
    assert_eq!(tables[0].column_widths, vec![2000, 3200, 3826]);
}

#[test]
fn test_every_section_of_written_docx_has_header_and_footer() {
    let registry = ThemeRegistry::bundled().unwrap();
    let output = temp_path("sections-01.docx");
    let report = build_to_file(&text_heavy_manuscript(), registry.get("01").unwrap(), &output)
        .unwrap();
    assert!(report.element_count > 0);

    let xml = read_package_part(&output, "word/document.xml");
    let sections = xml.matches("<w:sectPr>").count();
    assert!(sections >= 2, "expected a multi-section document, got {}", sections);
    assert_eq!(xml.matches("<w:headerReference").count(), sections);
    assert_eq!(xml.matches("<w:footerReference").count(), sections);

    let header = read_package_part(&output, "word/header1.xml");
    assert!(header.contains("<w:hdr"));
}

#[test]
fn test_written_docx_reads_back_as_manuscript() {
    let registry = ThemeRegistry::bundled().unwrap();
    let output = temp_path("round-trip-11.docx");
    build_to_file(&text_heavy_manuscript(), registry.get("11").unwrap(), &output).unwrap();

    let manuscript = Manuscript::load(&output).unwrap();

    assert!(manuscript.elements.iter().any(|e| matches!(
        e,
        Element::Heading { level: 2, text, .. } if text == "Background"
    )));
    assert!(manuscript
        .elements
        .iter()
        .any(|e| matches!(e, Element::Body { text, .. } if text == "Also short.")));
    assert_eq!(
        manuscript.image_base_dir,
        Some(docstyle::docx_source::media_dir(&output))
    );
}
