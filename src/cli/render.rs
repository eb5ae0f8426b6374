//! Human-readable output for the CLI.

use crate::alignment::{is_parse_failure, AlignmentRecord, ClauseRef, ParsedRecord, VerificationSummary};
use crate::anchor::{offset_to_line_col, ClauseSpan, NOT_APPLICABLE};
use crate::augment::AugmentReport;

const PREVIEW_LINES: usize = 6;

pub fn banner(title: &str) {
    let rule = "═".repeat(64);
    println!("╔{}╗", rule);
    println!("  {}", title);
    println!("╚{}╝", rule);
    println!();
}

pub fn print_records(records: &[AlignmentRecord], doc_a: &str, doc_b: &str) {
    if is_parse_failure(records) {
        println!("Model output could not be parsed; no topics aligned.");
        return;
    }
    if records.is_empty() {
        println!("No topics aligned.");
        return;
    }

    for record in records {
        println!("Topic: {}", record.topic);
        print_side("doc A", &record.doc_a, doc_a);
        print_side("doc B", &record.doc_b, doc_b);
        println!();
    }
}

pub fn print_side(label: &str, side: &ClauseSpan, document: &str) {
    match side {
        ClauseSpan::Found(span) => {
            let start = offset_to_line_col(document, span.start);
            let end = offset_to_line_col(document, span.end);
            println!(
                "  {} (lines {}-{}, bytes {}..{}):",
                label, start.line, end.line, span.start, span.end
            );
            print_indented(&span.text);
        }
        ClauseSpan::NotApplicable => println!("  {}: {}", label, NOT_APPLICABLE),
        ClauseSpan::Error { error } => println!("  {}: [Error: {}]", label, error),
    }
}

fn print_indented(text: &str) {
    let lines: Vec<&str> = text.lines().collect();
    for line in lines.iter().take(PREVIEW_LINES) {
        println!("    {}", line);
    }
    if lines.len() > PREVIEW_LINES {
        println!("    ... ({} more lines)", lines.len() - PREVIEW_LINES);
    }
}

pub fn print_parsed(records: &[ParsedRecord]) {
    for record in records {
        println!("Topic: {}", record.topic);
        println!("  doc A: {}", describe(&record.doc_a));
        println!("  doc B: {}", describe(&record.doc_b));
    }
}

fn describe(clause: &ClauseRef) -> String {
    match clause {
        ClauseRef::Quote { text } => format!("{:?}", text),
        ClauseRef::Anchors { start, end } => format!(
            "{:?} ... {:?}",
            start.as_phrase().unwrap_or(NOT_APPLICABLE),
            end.as_phrase().unwrap_or(NOT_APPLICABLE)
        ),
        ClauseRef::NotApplicable => NOT_APPLICABLE.to_string(),
    }
}

pub fn print_verification(summary: &VerificationSummary) {
    println!("Verification:");
    if summary.parse_failure {
        println!("  Parse failure: model output had no usable records");
    }
    println!("  Topics:          {}", summary.topics);
    println!("  Verified sides:  {}", summary.verified_sides);
    println!("  N/A sides:       {}", summary.not_applicable_sides);
    println!("  Failed sides:    {}", summary.failed_sides);
    if summary.stale_spans > 0 {
        println!("  Stale spans:     {}", summary.stale_spans);
    }
    if let Some(accuracy) = summary.accuracy() {
        println!("  Accuracy:        {:.1}%", accuracy);
    }
}

pub fn print_augmentation(report: &AugmentReport) {
    println!("Operation: {}", report.operation_id);
    if report.insertions.is_empty() && report.skipped.is_empty() {
        println!("No missing topics; document unchanged.");
        return;
    }

    for insertion in &report.insertions {
        println!(
            "Inserted '{}' at byte {} ({:?})",
            insertion.topic, insertion.offset, insertion.resolution
        );
        print_indented(&insertion.text);
    }
    for skipped in &report.skipped {
        println!("Skipped '{}': {}", skipped.topic, skipped.reason);
    }
    println!("Generation calls: {}", report.generation_calls);
}
