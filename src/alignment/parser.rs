//! Tolerant parsing of model alignment responses.
//!
//! Model output drifts: labels change case, the end label loses its
//! `DocA_` prefix, values come wrapped in quotes or markdown bold. Parsing
//! never fails; a response with no recognisable record becomes
//! [`ParsedResponse::Unparseable`].

use std::sync::LazyLock;

use regex::Regex;

use super::types::{AlignmentMode, ClauseRef, ParsedRecord, ParsedResponse};
use crate::anchor::{is_not_applicable, Anchor};

const DOC_A_MARKER: &str = "doc A:";
const DOC_B_MARKER: &str = ", doc B:";

/// One anchor block. Case-insensitive, `.` spans newlines, and the end
/// labels accept the bare `End` (and `DocA_End` on the B line) that models
/// emit by mistake.
static ANCHOR_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)Topic:\s*(?P<topic>.*?)[;\n]",
        r".*?DocA_Start:\s*(?P<a_start>.*?),\s*(?:DocA_End|End):\s*(?P<a_end>.*?)[;\n]",
        r".*?DocB_Start:\s*(?P<b_start>.*?),\s*(?:DocB_End|DocA_End|End):\s*(?P<b_end>.*?)(?:[;\n]|$)",
    ))
    .expect("anchor block regex should compile")
});

/// Parse a response in the given shape
pub fn parse_response(response: &str, mode: AlignmentMode) -> ParsedResponse {
    match mode {
        AlignmentMode::FullText => parse_full_text(response),
        AlignmentMode::Anchors => parse_anchors(response),
    }
}

/// Parse `Topic: doc A: <text>, doc B: <text>;` records.
///
/// Records missing either marker are skipped; the model declined to align
/// that topic.
pub fn parse_full_text(response: &str) -> ParsedResponse {
    let records: Vec<ParsedRecord> = response
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(parse_full_text_item)
        .collect();

    finish(records, response)
}

fn parse_full_text_item(item: &str) -> Option<ParsedRecord> {
    let (topic, rest) = item.split_once(':')?;
    let rest = rest.trim();

    let idx_a = rest.find(DOC_A_MARKER)?;
    let idx_b = rest.find(DOC_B_MARKER)?;
    let content_start = idx_a + DOC_A_MARKER.len();
    if idx_b < content_start {
        return None;
    }

    Some(ParsedRecord {
        topic: clean_topic(topic),
        doc_a: quote(&rest[content_start..idx_b]),
        doc_b: quote(&rest[idx_b + DOC_B_MARKER.len()..]),
    })
}

fn quote(value: &str) -> ClauseRef {
    if is_not_applicable(value) {
        ClauseRef::NotApplicable
    } else {
        ClauseRef::Quote {
            text: value.trim().to_string(),
        }
    }
}

/// Parse `Topic / DocA_Start / DocA_End / DocB_Start / DocB_End` blocks
pub fn parse_anchors(response: &str) -> ParsedResponse {
    let records: Vec<ParsedRecord> = ANCHOR_BLOCK_RE
        .captures_iter(response)
        .map(|caps| {
            let field = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();
            ParsedRecord {
                topic: clean_topic(field("topic")),
                doc_a: anchors(field("a_start"), field("a_end")),
                doc_b: anchors(field("b_start"), field("b_end")),
            }
        })
        .collect();

    finish(records, response)
}

fn anchors(start: &str, end: &str) -> ClauseRef {
    let start = Anchor::parse(clean_value(start));
    let end = Anchor::parse(clean_value(end));
    match (&start, &end) {
        (Anchor::NotApplicable, _) | (_, Anchor::NotApplicable) => ClauseRef::NotApplicable,
        _ => ClauseRef::Anchors { start, end },
    }
}

/// Strip surrounding whitespace, then double quotes, then single quotes
pub fn clean_value(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'').trim()
}

fn clean_topic(topic: &str) -> String {
    topic.trim().trim_matches('*').trim().to_string()
}

fn finish(records: Vec<ParsedRecord>, response: &str) -> ParsedResponse {
    if records.is_empty() {
        ParsedResponse::Unparseable {
            raw: response.to_string(),
        }
    } else {
        ParsedResponse::Records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(parsed: ParsedResponse) -> Vec<ParsedRecord> {
        match parsed {
            ParsedResponse::Records(records) => records,
            ParsedResponse::Unparseable { raw } => panic!("unexpected parse failure: {}", raw),
        }
    }

    fn anchor_ref(start: &str, end: &str) -> ClauseRef {
        ClauseRef::Anchors {
            start: Anchor::Phrase(start.to_string()),
            end: Anchor::Phrase(end.to_string()),
        }
    }

    #[test]
    fn test_full_text_records() {
        let response = "Definitions: doc A: \"Confidential Information\" means all data, doc B: Proprietary data;\n\
                        Term: doc A: This lasts 2 years., doc B: N/A;";
        let parsed = records(parse_full_text(response));

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].topic, "Definitions");
        assert_eq!(
            parsed[0].doc_a,
            ClauseRef::Quote {
                text: "\"Confidential Information\" means all data".to_string()
            }
        );
        assert_eq!(
            parsed[0].doc_b,
            ClauseRef::Quote {
                text: "Proprietary data".to_string()
            }
        );
        assert_eq!(parsed[1].doc_b, ClauseRef::NotApplicable);
    }

    #[test]
    fn test_full_text_skips_records_without_markers() {
        let response = "Here are the alignments;\nTerm: doc A: Two years., doc B: Three years.;\nLaw: doc A: Delaware";
        let parsed = records(parse_full_text(response));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].topic, "Term");
    }

    #[test]
    fn test_full_text_rejects_inverted_markers() {
        let parsed = parse_full_text("Term: , doc B: x doc A: y");
        assert!(matches!(parsed, ParsedResponse::Unparseable { .. }));
    }

    #[test]
    fn test_anchor_blocks() {
        let response = "Topic: Confidentiality;\n\
                        DocA_Start: The Recipient, DocA_End: strict confidence.;\n\
                        DocB_Start: \"Receiving Party\", DocB_End: 'not disclose.';\n\
                        \n\
                        Topic: Term;\n\
                        DocA_Start: This lasts, DocA_End: 2 years.;\n\
                        DocB_Start: N/A, DocB_End: N/A;\n";
        let parsed = records(parse_anchors(response));

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].topic, "Confidentiality");
        assert_eq!(parsed[0].doc_a, anchor_ref("The Recipient", "strict confidence."));
        assert_eq!(parsed[0].doc_b, anchor_ref("Receiving Party", "not disclose."));
        assert_eq!(parsed[1].topic, "Term");
        assert_eq!(parsed[1].doc_b, ClauseRef::NotApplicable);
    }

    #[test]
    fn test_anchor_label_drift() {
        let response = "**topic:** Governing Law\n\
                        doca_start: This Agreement, End: of Delaware.\n\
                        DOCB_START: Governed by, DocA_End: New York law.";
        let parsed = records(parse_anchors(response));

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].topic, "Governing Law");
        assert_eq!(parsed[0].doc_a, anchor_ref("This Agreement", "of Delaware."));
        assert_eq!(parsed[0].doc_b, anchor_ref("Governed by", "New York law."));
    }

    #[test]
    fn test_unstructured_input_is_unparseable() {
        for raw in ["", "   \n", "{\"topic\": \"Term\"}", "\u{0}\u{1}\u{fffd}garbage\u{7f}"] {
            let parsed = parse_anchors(raw);
            assert_eq!(
                parsed,
                ParsedResponse::Unparseable {
                    raw: raw.to_string()
                }
            );
            assert!(matches!(parse_full_text(raw), ParsedResponse::Unparseable { .. }));
        }
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value(" \"The Recipient\" "), "The Recipient");
        assert_eq!(clean_value("'not disclose.'"), "not disclose.");
        assert_eq!(clean_value("plain"), "plain");
    }
}
