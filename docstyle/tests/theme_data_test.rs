use docstyle::style::resolve;
use docstyle::theme::{normalize_id, TemplateKind, ThemeRegistry, DEFAULT_TEMPLATE_ID};
use docstyle::CustomSettings;

fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[test]
fn test_bundled_theme_ids() {
    let registry = ThemeRegistry::bundled().unwrap();

    assert_eq!(registry.len(), 41);
    assert!(registry.get(DEFAULT_TEMPLATE_ID).is_ok());
    for id in ["01", "02", "11", "30", "46", "48", "50"] {
        assert!(registry.get(id).is_ok(), "template {} should exist", id);
    }
    for id in ["03", "10", "47", "51"] {
        assert!(registry.get(id).is_err(), "template {} should not exist", id);
    }
}

#[test]
fn test_short_and_padded_ids_resolve_to_the_same_template() {
    let registry = ThemeRegistry::bundled().unwrap();

    assert_eq!(normalize_id("1"), "01");
    assert_eq!(registry.get("1").unwrap(), registry.get("001").unwrap());
    assert_eq!(registry.get("25").unwrap(), registry.get(" 25 ").unwrap());
}

#[test]
fn test_every_theme_is_complete() {
    let registry = ThemeRegistry::bundled().unwrap();

    for (id, theme) in registry.iter() {
        assert!(!theme.name.is_empty(), "{} has no name", id);
        assert!(!theme.font.is_empty(), "{} has no font", id);

        let p = &theme.palette;
        for color in [
            &p.bg_head, &p.bg_box, &p.bg_red, &p.bg_green, &p.bg_amber, &p.white, &p.text,
            &p.dark, &p.gray, &p.gray2, &p.gray3, &p.accent, &p.blue, &p.blue2, &p.box_border,
            &p.green, &p.amber, &p.rule,
        ] {
            assert!(is_hex_color(color), "{} has invalid colour {:?}", id, color);
        }
    }
}

#[test]
fn test_every_kind_is_represented() {
    let registry = ThemeRegistry::bundled().unwrap();

    for kind in [
        TemplateKind::Editorial,
        TemplateKind::Minimal,
        TemplateKind::Tech,
        TemplateKind::Business,
    ] {
        assert!(
            registry.iter().any(|(_, theme)| theme.kind == kind),
            "no {} template",
            kind
        );
    }
}

#[test]
fn test_base_size_drives_heading_sizes_for_every_theme() {
    let registry = ThemeRegistry::bundled().unwrap();

    for base in [16, 20, 22, 28] {
        let settings = CustomSettings {
            base_size: Some(base),
            style_preset: Some("magazine".to_string()),
            ..CustomSettings::default()
        };
        for (_, theme) in registry.iter() {
            let style = resolve(theme, &settings);
            assert_eq!(style.sizes.body, base);
            assert_eq!(style.sizes.h1, base + 8);
            assert_eq!(style.sizes.h2, base + 4);
            assert_eq!(style.sizes.h3, base + 2);
        }
    }
}
