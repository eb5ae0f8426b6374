//! Augmentation Integration Tests
//!
//! Tests for missing-topic detection, insertion planning, and the full
//! align-then-augment flow against a scripted generator.

use clausealign::alignment::AlignmentMode;
use clausealign::anchor::{ClauseSpan, Span, SpanError, TextLocator};
use clausealign::augment::InsertionResolution;
use clausealign::prompts::PromptKind;
use clausealign::{
    find_missing, plan_insertion, AlignmentRecord, InsertionPlan, Orchestrator, ScriptedGenerator,
};

const DOC_A: &str = "1. Confidentiality\nRecipient agrees to hold information secret.\n2. Term\nThis lasts 2 years.";
const DOC_B: &str = "1. Confidentiality\nReceiving party shall not disclose data.\n";

const ALIGNMENT: &str = "Topic: Confidentiality;\n\
DocA_Start: Recipient agrees, DocA_End: information secret.;\n\
DocB_Start: Receiving party, DocB_End: disclose data.;\n\
Topic: Term;\n\
DocA_Start: This lasts, DocA_End: 2 years.;\n\
DocB_Start: N/A, DocB_End: N/A;\n";

fn found(document: &str, text: &str) -> ClauseSpan {
    let start = document.find(text).unwrap();
    ClauseSpan::Found(Span::from_document(document, start, start + text.len()).unwrap())
}

#[test]
fn test_find_missing_filters_and_keeps_order() {
    let records = vec![
        AlignmentRecord::new("Term", found(DOC_A, "This lasts 2 years."), ClauseSpan::NotApplicable),
        AlignmentRecord::new(
            "Confidentiality",
            found(DOC_A, "Recipient agrees"),
            found(DOC_B, "Receiving party"),
        ),
        AlignmentRecord::new(
            "Remedies",
            found(DOC_A, "information secret."),
            ClauseSpan::error(SpanError::StartAnchorNotFound {
                anchor: "Injunctive relief".to_string(),
            }),
        ),
        AlignmentRecord::new("Definitions", ClauseSpan::NotApplicable, ClauseSpan::NotApplicable),
        AlignmentRecord::new("Notices", found(DOC_A, "1. Confidentiality"), ClauseSpan::NotApplicable),
    ];

    let missing = find_missing(&records);
    let topics: Vec<&str> = missing.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(topics, vec!["Term", "Notices"]);
    assert_eq!(missing[0].target_content, "This lasts 2 years.");
}

#[test]
fn test_sequential_insertions_resolve_against_updated_text() {
    let locator = TextLocator::default();

    let first = plan_insertion(&locator, DOC_B, Some("PRECEDING_SNIPPET: disclose data."));
    assert_eq!(first.resolution, InsertionResolution::Exact);
    let text = first.apply(DOC_B, "2. Term\nThis lasts 2 years.");

    // The second snippet only exists after the first insertion
    let second = plan_insertion(&locator, &text, Some("PRECEDING_SNIPPET: \"lasts 2 years.\""));
    assert_eq!(second.resolution, InsertionResolution::Exact);
    let text = second.apply(&text, "3. Notices\nIn writing.");

    assert_eq!(
        text,
        "1. Confidentiality\nReceiving party shall not disclose data.\
         \n\n2. Term\nThis lasts 2 years.\
         \n\n3. Notices\nIn writing.\n\n\n"
    );
}

#[test]
fn test_unresolvable_snippet_appends() {
    let locator = TextLocator::default();

    let plan = plan_insertion(&locator, DOC_B, Some("PRECEDING_SNIPPET: Article 9 Arbitration"));
    assert_eq!(plan, InsertionPlan::append(DOC_B, Some("Article 9 Arbitration".to_string())));

    let plan = plan_insertion(&locator, DOC_B, Some("Put it at the end."));
    assert_eq!(plan.offset, DOC_B.len());
    assert_eq!(plan.resolution, InsertionResolution::AppendFallback);
    assert_eq!(plan.snippet, None);
}

#[tokio::test]
async fn test_align_and_augment_end_to_end() {
    let generator = ScriptedGenerator::new();
    generator
        .push(PromptKind::AlignAnchors, ALIGNMENT)
        .push(PromptKind::DraftClause, "2. Term\nThis agreement lasts 2 years.")
        .push(PromptKind::InsertionPoint, "PRECEDING_SNIPPET: disclose data.");

    let orchestrator = Orchestrator::new(Box::new(generator.clone()));
    let (alignment, augmented) = orchestrator
        .align_and_augment(DOC_A, DOC_B, AlignmentMode::Anchors)
        .await
        .unwrap();

    assert_eq!(alignment.records.len(), 2);
    assert_eq!(alignment.records[0].topic, "Confidentiality");
    assert_eq!(
        alignment.records[0].doc_b.span().unwrap().text,
        "Receiving party shall not disclose data."
    );
    assert_eq!(alignment.records[1].topic, "Term");
    assert_eq!(alignment.records[1].doc_a.span().unwrap().text, "This lasts 2 years.");
    assert_eq!(alignment.records[1].doc_b, ClauseSpan::NotApplicable);

    assert_eq!(augmented.insertions.len(), 1);
    assert_eq!(augmented.insertions[0].topic, "Term");
    assert_eq!(augmented.insertions[0].resolution, InsertionResolution::Exact);
    assert!(augmented.skipped.is_empty());
    assert_eq!(augmented.generation_calls, 2);

    let text = &augmented.augmented_text;
    assert!(text.len() > DOC_B.len());
    assert!(text.starts_with("1. Confidentiality\nReceiving party shall not disclose data."));
    assert!(text.contains("disclose data.\n\n2. Term\nThis agreement lasts 2 years.\n"));

    // Draft prompt carries the doc A clause; insertion prompt the draft
    let received = generator.received();
    let kinds: Vec<PromptKind> = received.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![PromptKind::AlignAnchors, PromptKind::DraftClause, PromptKind::InsertionPoint]
    );
    assert!(received[1].user.contains("This lasts 2 years."));
    assert!(received[2].user.contains("This agreement lasts 2 years."));
}

#[tokio::test]
async fn test_augment_without_missing_topics_is_noop() {
    let generator = ScriptedGenerator::new();
    let orchestrator = Orchestrator::new(Box::new(generator.clone()));

    let records = vec![AlignmentRecord::new(
        "Confidentiality",
        found(DOC_A, "Recipient agrees"),
        found(DOC_B, "Receiving party"),
    )];
    let report = orchestrator.augment(DOC_B, &records).await.unwrap();

    assert_eq!(report.augmented_text, DOC_B);
    assert!(report.insertions.is_empty());
    assert_eq!(report.generation_calls, 0);
    assert!(generator.received().is_empty());
}
