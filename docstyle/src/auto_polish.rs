//! Auto-polish: restructuring of text-heavy manuscripts
//!
//! A manuscript that is mostly running text (few tables, images or boxes) reads
//! better when long paragraphs are broken up, the first paragraph after a
//! heading is set as a lead, and top-level sections are separated by dividers.
//! [`classify`] decides whether a manuscript qualifies; [`polish`] rewrites the
//! element sequence. Both are pure and deterministic.

use crate::manuscript::{CustomSettings, Element, ElementKind};

/// Thresholds for one auto-polish level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolishProfile {
    /// Minimum number of elements for a manuscript to qualify
    pub min_elements: usize,
    /// Minimum share of text-type elements
    pub text_ratio_min: f64,
    /// Maximum share of heavy-type elements (never fewer than two allowed)
    pub heavy_ratio_max: f64,
    /// Body text at least this long is split in two
    pub split_min_chars: usize,
    /// Body text after a heading at least this long becomes a lead
    pub lead_min_chars: usize,
    /// Target length of the first chunk when splitting at sentences
    pub first_chunk_chars: usize,
    /// Level-1 headings from this ordinal (0-based count seen) get a divider
    pub insert_divider_from_nth_h1: usize,
}

impl PolishProfile {
    pub const WEAK: PolishProfile = PolishProfile {
        min_elements: 8,
        text_ratio_min: 0.80,
        heavy_ratio_max: 0.12,
        split_min_chars: 680,
        lead_min_chars: 110,
        first_chunk_chars: 280,
        insert_divider_from_nth_h1: 2,
    };

    pub const NORMAL: PolishProfile = PolishProfile {
        min_elements: 6,
        text_ratio_min: 0.72,
        heavy_ratio_max: 0.18,
        split_min_chars: 520,
        lead_min_chars: 70,
        first_chunk_chars: 220,
        insert_divider_from_nth_h1: 1,
    };

    pub const STRONG: PolishProfile = PolishProfile {
        min_elements: 5,
        text_ratio_min: 0.65,
        heavy_ratio_max: 0.24,
        split_min_chars: 380,
        lead_min_chars: 45,
        first_chunk_chars: 170,
        insert_divider_from_nth_h1: 1,
    };
}

/// Auto-polish severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolishLevel {
    Off,
    Weak,
    #[default]
    Normal,
    Strong,
}

impl PolishLevel {
    /// All levels, weakest first
    pub const ALL: [PolishLevel; 4] = [
        PolishLevel::Off,
        PolishLevel::Weak,
        PolishLevel::Normal,
        PolishLevel::Strong,
    ];

    /// Parse a level name; anything unrecognised is [`PolishLevel::Normal`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "off" => PolishLevel::Off,
            "weak" => PolishLevel::Weak,
            "strong" => PolishLevel::Strong,
            _ => PolishLevel::Normal,
        }
    }

    /// Effective level for the given settings
    ///
    /// An explicit `auto_polish: false` switches auto-polish off regardless of
    /// the requested level.
    pub fn from_settings(settings: &CustomSettings) -> Self {
        if settings.auto_polish == Some(false) {
            return PolishLevel::Off;
        }
        settings
            .auto_polish_level
            .as_deref()
            .map(PolishLevel::from_name)
            .unwrap_or_default()
    }

    /// Thresholds for this level, `None` when off
    pub fn profile(self) -> Option<PolishProfile> {
        match self {
            PolishLevel::Off => None,
            PolishLevel::Weak => Some(PolishProfile::WEAK),
            PolishLevel::Normal => Some(PolishProfile::NORMAL),
            PolishLevel::Strong => Some(PolishProfile::STRONG),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PolishLevel::Off => "off",
            PolishLevel::Weak => "weak",
            PolishLevel::Normal => "normal",
            PolishLevel::Strong => "strong",
        }
    }
}

impl std::fmt::Display for PolishLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Shape statistics behind an eligibility decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub total: usize,
    pub text_count: usize,
    pub heavy_count: usize,
    /// Largest heavy count the profile tolerates
    pub heavy_limit: usize,
    pub eligible: bool,
}

impl Classification {
    /// Share of text-type elements (0 for an empty manuscript)
    pub fn text_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.text_count as f64 / self.total as f64
        }
    }
}

/// Running text and its structure
fn is_text_type(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::H1
            | ElementKind::H2
            | ElementKind::H3
            | ElementKind::Body
            | ElementKind::Quote
            | ElementKind::Bullets
            | ElementKind::Hr
            | ElementKind::Empty
    )
}

/// Elements that already structure the page on their own
fn is_heavy_type(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Image
            | ElementKind::Table2
            | ElementKind::Table3
            | ElementKind::Qa
            | ElementKind::Prompt
            | ElementKind::Conclusion
    )
}

/// Measure a manuscript against a profile
pub fn classify(elements: &[Element], profile: &PolishProfile) -> Classification {
    let total = elements.len();
    let text_count = elements.iter().filter(|e| is_text_type(e.kind())).count();
    let heavy_count = elements.iter().filter(|e| is_heavy_type(e.kind())).count();
    let heavy_limit = 2usize.max((total as f64 * profile.heavy_ratio_max).floor() as usize);

    let eligible = total >= profile.min_elements
        && text_count as f64 / total as f64 >= profile.text_ratio_min
        && heavy_count <= heavy_limit;

    Classification {
        total,
        text_count,
        heavy_count,
        heavy_limit,
        eligible,
    }
}

/// Whether a manuscript is text-heavy enough to auto-polish
pub fn is_text_heavy(elements: &[Element], profile: &PolishProfile) -> bool {
    classify(elements, profile).eligible
}

/// Rewrite an element sequence
///
/// Level-1 headings from the profile's ordinal on get a section divider in
/// front of them, a long body paragraph straight after a heading is split into
/// a lead and the remainder, other overlong body paragraphs are split in two,
/// and empty body paragraphs are dropped. Everything else passes through.
pub fn polish(elements: &[Element], profile: &PolishProfile) -> Vec<Element> {
    let mut polished = Vec::with_capacity(elements.len() + elements.len() / 4);
    let mut h1_count = 0usize;
    let mut just_saw_heading = false;

    for element in elements {
        match element {
            Element::Heading { level: 1, text, .. } => {
                if h1_count >= profile.insert_divider_from_nth_h1 {
                    polished.push(Element::SectionDivider { text: text.clone() });
                }
                polished.push(element.clone());
                h1_count += 1;
                just_saw_heading = true;
            }
            Element::Heading { .. } => {
                polished.push(element.clone());
                just_saw_heading = true;
            }
            Element::Body { text, indent } => {
                let trimmed = text.trim();
                let length = char_len(trimmed);

                if trimmed.is_empty() {
                    log::debug!("Dropping empty body paragraph");
                } else if just_saw_heading && length >= profile.lead_min_chars {
                    let (lead, remainder) = split_long_text(trimmed, profile);
                    polished.push(Element::Lead {
                        text: if lead.is_empty() { trimmed.to_string() } else { lead },
                    });
                    if !remainder.is_empty() {
                        polished.push(Element::Body {
                            text: remainder,
                            indent: *indent,
                        });
                    }
                } else if length >= profile.split_min_chars {
                    let (first, second) = split_long_text(trimmed, profile);
                    polished.push(Element::Body {
                        text: if first.is_empty() { trimmed.to_string() } else { first },
                        indent: *indent,
                    });
                    if !second.is_empty() {
                        polished.push(Element::Body {
                            text: second,
                            indent: *indent,
                        });
                    }
                } else {
                    polished.push(element.clone());
                }

                just_saw_heading = false;
            }
            other => {
                polished.push(other.clone());
                just_saw_heading = false;
            }
        }
    }

    polished
}

/// Split a long text in two, preferring sentence boundaries
///
/// Text shorter than `split_min_chars` comes back whole as the first part.
/// Otherwise leading sentences are gathered into the first part until it
/// reaches `first_chunk_chars`, always leaving at least one sentence for the
/// second part. A text without a sentence boundary is cut at its midpoint.
///
/// # Returns
/// * `(first, second)` - Trimmed parts; `second` is empty when no split happened
pub fn split_long_text(text: &str, profile: &PolishProfile) -> (String, String) {
    let src = text.trim();
    if src.is_empty() {
        return (String::new(), String::new());
    }
    if char_len(src) < profile.split_min_chars {
        return (src.to_string(), String::new());
    }

    let sentences = split_sentences(src);
    if sentences.len() < 2 {
        let mid = char_len(src) / 2;
        let byte_mid = src
            .char_indices()
            .nth(mid)
            .map(|(i, _)| i)
            .unwrap_or(src.len());
        let (head, tail) = src.split_at(byte_mid);
        return (head.trim().to_string(), tail.trim().to_string());
    }

    let mut first = String::new();
    let mut taken = 0;
    while taken < sentences.len() - 1 && char_len(&first) < profile.first_chunk_chars {
        if !first.is_empty() {
            first.push(' ');
        }
        first.push_str(sentences[taken]);
        taken += 1;
    }
    let second = sentences[taken..].join(" ");

    (first.trim().to_string(), second.trim().to_string())
}

/// Sentence terminators, ASCII and full-width
fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

/// Split after a terminator that is followed by whitespace
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && prev.is_some_and(is_sentence_end) {
            sentences.push(&text[start..i]);
            let mut next_start = text.len();
            while let Some(&(j, next)) = chars.peek() {
                if next.is_whitespace() {
                    chars.next();
                } else {
                    next_start = j;
                    break;
                }
            }
            start = next_start;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences.retain(|s| !s.is_empty());
    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A sentence of exactly `len` characters ending in `end`
    fn sentence(len: usize, end: char) -> String {
        let mut s = "w".repeat(len - 1);
        s.push(end);
        s
    }

    fn test_profile() -> PolishProfile {
        PolishProfile {
            min_elements: 6,
            text_ratio_min: 0.5,
            heavy_ratio_max: 0.18,
            split_min_chars: 100,
            lead_min_chars: 40,
            first_chunk_chars: 50,
            insert_divider_from_nth_h1: 1,
        }
    }

    fn tip() -> Element {
        Element::Tip {
            text: "tip".to_string(),
        }
    }

    #[test]
    fn test_level_resolution() {
        assert_eq!(PolishLevel::from_settings(&CustomSettings::default()), PolishLevel::Normal);

        let settings = CustomSettings {
            auto_polish_level: Some("STRONG".to_string()),
            ..Default::default()
        };
        assert_eq!(PolishLevel::from_settings(&settings), PolishLevel::Strong);

        let settings = CustomSettings {
            auto_polish: Some(false),
            auto_polish_level: Some("strong".to_string()),
            ..Default::default()
        };
        assert_eq!(PolishLevel::from_settings(&settings), PolishLevel::Off);
        assert_eq!(PolishLevel::from_name("extreme"), PolishLevel::Normal);
        assert!(PolishLevel::Off.profile().is_none());
    }

    #[test]
    fn test_classifier_threshold_boundary() {
        let profile = test_profile();
        // Every split of six elements into text and neutral ones
        for text_count in 0..=6 {
            let mut elements: Vec<Element> = (0..text_count).map(|_| Element::body("x")).collect();
            elements.extend((text_count..6).map(|_| tip()));

            let result = classify(&elements, &profile);
            assert_eq!(result.text_count, text_count);
            assert_eq!(result.eligible, text_count >= 3, "text_count = {}", text_count);
        }
    }

    #[test]
    fn test_classifier_requires_min_elements() {
        let profile = test_profile();
        let elements: Vec<Element> = (0..5).map(|_| Element::body("x")).collect();
        assert!(!is_text_heavy(&elements, &profile));
        assert!(!is_text_heavy(&[], &profile));
    }

    #[test]
    fn test_classifier_rejects_heavy_documents() {
        let profile = PolishProfile::NORMAL;
        let mut elements: Vec<Element> = (0..17).map(|_| Element::body("x")).collect();
        elements.extend((0..3).map(|_| Element::Conclusion { lines: vec![] }));

        // 20 elements: limit is max(2, floor(20 * 0.18)) = 3
        let result = classify(&elements, &profile);
        assert_eq!(result.heavy_limit, 3);
        assert!(result.eligible);

        elements.push(Element::Qa {
            question: "q".to_string(),
            answers: vec![],
        });
        elements.push(Element::body("x"));
        // 22 elements: limit is still 3, four heavy
        assert!(!is_text_heavy(&elements, &profile));
    }

    #[test]
    fn test_divider_count() {
        let profile = PolishProfile::NORMAL;
        for n in 0..5usize {
            for k in 0..4usize {
                let profile = PolishProfile {
                    insert_divider_from_nth_h1: k,
                    ..profile
                };
                let elements: Vec<Element> = (0..n)
                    .flat_map(|i| {
                        vec![
                            Element::heading(1, (i + 1).to_string(), format!("Part {}", i)),
                            Element::body("short"),
                        ]
                    })
                    .collect();

                let polished = polish(&elements, &profile);
                let dividers: Vec<usize> = polished
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| matches!(e, Element::SectionDivider { .. }))
                    .map(|(i, _)| i)
                    .collect();

                // Headings before the k-th (0-based) one stay undivided
                assert_eq!(dividers.len(), n.saturating_sub(k), "n = {}, k = {}", n, k);
                for idx in dividers {
                    let Element::SectionDivider { text } = &polished[idx] else {
                        unreachable!()
                    };
                    assert!(matches!(
                        &polished[idx + 1],
                        Element::Heading { level: 1, text: heading, .. } if heading == text
                    ));
                }
            }
        }
    }

    #[test]
    fn test_two_sentence_split_is_lossless() {
        let profile = test_profile();
        for end in ['.', '?', '!', '。'] {
            let first = sentence(60, end);
            let second = sentence(70, '.');
            let text = format!("{} {}", first, second);

            let polished = polish(&[Element::body(text.clone())], &profile);

            assert_eq!(polished.len(), 2);
            let parts: Vec<&str> = polished
                .iter()
                .map(|e| match e {
                    Element::Body { text, .. } => text.as_str(),
                    other => panic!("unexpected element {:?}", other),
                })
                .collect();
            assert!(parts.iter().all(|p| !p.is_empty()));
            assert_eq!(parts.join(" "), text);
        }
    }

    #[test]
    fn test_short_first_sentence_still_leaves_a_second_part() {
        let profile = test_profile();
        let text = format!("{} {}", sentence(10, '.'), sentence(120, '.'));
        let (first, second) = split_long_text(&text, &profile);
        assert_eq!(first.chars().count(), 10);
        assert_eq!(second.chars().count(), 120);
    }

    #[test]
    fn test_single_sentence_splits_at_midpoint() {
        let profile = test_profile();
        let text = "a".repeat(60) + &"b".repeat(60);
        let (first, second) = split_long_text(&text, &profile);
        assert_eq!(first, "a".repeat(60));
        assert_eq!(second, "b".repeat(60));
    }

    #[test]
    fn test_midpoint_split_respects_char_boundaries() {
        let profile = test_profile();
        let text = "가".repeat(101);
        let (first, second) = split_long_text(&text, &profile);
        assert_eq!(first.chars().count(), 50);
        assert_eq!(second.chars().count(), 51);
    }

    #[test]
    fn test_short_text_is_not_split() {
        let profile = test_profile();
        let (first, second) = split_long_text("  Short. Text.  ", &profile);
        assert_eq!(first, "Short. Text.");
        assert!(second.is_empty());
        assert_eq!(split_long_text("   ", &profile), (String::new(), String::new()));
    }

    #[test]
    fn test_greedy_first_chunk() {
        let profile = test_profile();
        let sentences: Vec<String> = (0..5).map(|_| sentence(30, '.')).collect();
        let (first, second) = split_long_text(&sentences.join(" "), &profile);
        // 30 < 50, then 61 >= 50: two sentences in the first chunk
        assert_eq!(first, sentences[..2].join(" "));
        assert_eq!(second, sentences[2..].join(" "));
    }

    #[test]
    fn test_lead_after_heading() {
        let profile = test_profile();
        let elements = vec![
            Element::heading(2, "", "Section"),
            Element::body(sentence(45, '.')),
            Element::body(sentence(45, '.')),
        ];

        let polished = polish(&elements, &profile);

        assert_eq!(
            polished,
            vec![
                Element::heading(2, "", "Section"),
                Element::Lead {
                    text: sentence(45, '.')
                },
                Element::body(sentence(45, '.')),
            ]
        );
    }

    #[test]
    fn test_long_lead_keeps_remainder() {
        let profile = test_profile();
        let text = format!("{} {}", sentence(60, '.'), sentence(60, '.'));
        let polished = polish(&[Element::heading(3, "", "H"), Element::body(text)], &profile);

        assert_eq!(polished.len(), 3);
        assert!(matches!(polished[1], Element::Lead { .. }));
        assert!(matches!(polished[2], Element::Body { .. }));
    }

    #[test]
    fn test_empty_body_is_dropped_and_clears_heading() {
        let profile = test_profile();
        let elements = vec![
            Element::heading(2, "", "H"),
            Element::body("   "),
            Element::body(sentence(45, '.')),
        ];
        let polished = polish(&elements, &profile);
        assert_eq!(
            polished,
            vec![Element::heading(2, "", "H"), Element::body(sentence(45, '.'))]
        );
    }

    #[test]
    fn test_other_elements_pass_through() {
        let profile = test_profile();
        let elements = vec![
            Element::heading(2, "", "H"),
            tip(),
            Element::body(sentence(45, '.')),
            Element::Hr { size: 4 },
        ];
        assert_eq!(polish(&elements, &profile), elements);
    }

    #[test]
    fn test_split_sentences_handles_whitespace_runs() {
        assert_eq!(
            split_sentences("One.  Two!\nThree? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
        assert_eq!(split_sentences("v1.2 is out"), vec!["v1.2 is out"]);
        assert_eq!(split_sentences("끝。 다음"), vec!["끝。", "다음"]);
    }
}
