//! Prompt builders for the generation calls.
//!
//! Each builder produces a [`Prompt`] with a system and a user message.
//! The response formats requested here are the ones
//! [`crate::alignment::parser`] and [`crate::augment::insertion`] parse.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentMode;

/// Marker that precedes the insertion snippet in model output
pub const PRECEDING_SNIPPET_MARKER: &str = "PRECEDING_SNIPPET:";

/// Characters of the weaker document kept from its head for the style sample
pub const STYLE_HEAD_CHARS: usize = 2000;

/// Characters of the weaker document kept from its tail for the style sample
pub const STYLE_TAIL_CHARS: usize = 1000;

/// What a prompt asks the model to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    AlignFullText,
    AlignAnchors,
    DraftClause,
    InsertionPoint,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::AlignFullText => "align_full_text",
            PromptKind::AlignAnchors => "align_anchors",
            PromptKind::DraftClause => "draft_clause",
            PromptKind::InsertionPoint => "insertion_point",
        }
    }
}

impl From<AlignmentMode> for PromptKind {
    fn from(mode: AlignmentMode) -> Self {
        match mode {
            AlignmentMode::FullText => PromptKind::AlignFullText,
            AlignmentMode::Anchors => PromptKind::AlignAnchors,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A two-message chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Both messages joined, for backends that take a single text input
    pub fn to_plain_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Alignment prompt for the requested response shape
pub fn alignment(doc_a: &str, doc_b: &str, mode: AlignmentMode) -> Prompt {
    match mode {
        AlignmentMode::FullText => align_full_text(doc_a, doc_b),
        AlignmentMode::Anchors => align_anchors(doc_a, doc_b),
    }
}

/// Ask for verbatim clause text per topic
pub fn align_full_text(doc_a: &str, doc_b: &str) -> Prompt {
    let user = format!(
        r#"Align the two legal documents below by topic.

=== DOCUMENT A START ===
{doc_a}
=== DOCUMENT A END ===

=== DOCUMENT B START ===
{doc_b}
=== DOCUMENT B END ===

Instructions:
1. Find topics the documents share (Definitions, Confidentiality Obligations, Term, Termination, Governing Law, ...).
2. For each topic, copy the EXACT text from Document A and the matching EXACT text from Document B.
3. Use exactly this format, one entry per topic:
   Topic: doc A: <text from A>, doc B: <text from B>;

   Example:
   Obligations: doc A: Recipient agrees to hold information in strict confidence., doc B: Receiving Party shall not disclose...;

Rules:
- Copy text exactly as it appears, including punctuation, whitespace, and line breaks.
- Do not fix typos, spacing, or extraction artifacts such as "discussi ons".
- Keep page headers or footers that fall inside a clause.
- Never paraphrase or summarize.
- Write "N/A" for a side that has no matching clause.
- End each entry with a semicolon and a newline.
- Output only the entries."#
    );

    Prompt {
        kind: PromptKind::AlignFullText,
        system: "You are a precise legal assistant.".to_string(),
        user,
    }
}

/// Ask for the first and last words of each clause
pub fn align_anchors(doc_a: &str, doc_b: &str) -> Prompt {
    let user = format!(
        r#"Identify the topics two legal documents have in common.

=== DOC A ===
{doc_a}
=== END DOC A ===

=== DOC B ===
{doc_b}
=== END DOC B ===

Task:
1. Find shared topics (Definitions, Term, Termination, ...).
2. For each topic do NOT output the clause. Output its FIRST 2 WORDS and LAST 2 WORDS in each document.
3. Use exactly this format:
   Topic: <topic name>;
   DocA_Start: <first 2 words>, DocA_End: <last 2 words>;
   DocB_Start: <first 2 words>, DocB_End: <last 2 words>;

   Example:
   Topic: Confidentiality;
   DocA_Start: The Recipient, DocA_End: strict confidence.;
   DocB_Start: Receiving Party, DocB_End: not disclose.;

Rules:
- Anchors must match the document text exactly.
- Write "N/A" for both anchors when a document lacks the topic.
- Output only the structured blocks."#
    );

    Prompt {
        kind: PromptKind::AlignAnchors,
        system: "You are a robotic alignment tool.".to_string(),
        user,
    }
}

/// First and last characters of the weaker document, used to show the
/// drafter its tone and formatting
pub fn style_sample(document: &str) -> String {
    let head: String = document.chars().take(STYLE_HEAD_CHARS).collect();
    let total = document.chars().count();
    let tail: String = document
        .chars()
        .skip(total.saturating_sub(STYLE_TAIL_CHARS))
        .collect();
    format!("{}\n...\n{}", head, tail)
}

/// Ask for a new clause covering `target_clause` in the style of the sample
pub fn draft_clause(target_clause: &str, style_sample: &str, topic: &str) -> Prompt {
    let user = format!(
        r#"Draft a new clause on "{topic}" to insert into an existing document (the "Mod Document").

Target Clause (source of truth):
"{target_clause}"

Mod Document Style Sample:
=== START SAMPLE ===
{style_sample}
=== END SAMPLE ===

Instructions:
1. Read the Target Clause for the obligation or definition it establishes.
2. Read the style sample for tone, defined terms ("Company" vs "Discloser", "shall" vs "will"), and numbering.
3. Write a NEW clause with the same legal effect as the Target Clause, in exactly the Mod Document's style.
4. Output only the clause, with no introduction."#
    );

    Prompt {
        kind: PromptKind::DraftClause,
        system: "You are a precise legal drafter.".to_string(),
        user,
    }
}

/// Ask for the text that should immediately precede a new clause
pub fn insertion_point(document: &str, new_clause: &str, topic: &str) -> Prompt {
    let user = format!(
        r#"A new clause about "{topic}" must be inserted into the document below.

New Clause:
"{new_clause}"

Document:
=== START DOCUMENT ===
{document}
=== END DOCUMENT ===

Instructions:
1. Work out how the document is structured.
2. Pick the most logical place for the new clause: next to related topics, or in conventional order (Definitions first, General Provisions last).
3. Quote the exact document text (about 20-50 characters) that should come IMMEDIATELY BEFORE the new clause.
4. Answer in this format:
   {PRECEDING_SNIPPET_MARKER} <exact text from document>

   Example:
   {PRECEDING_SNIPPET_MARKER} Section 3. Confidentiality."#
    );

    Prompt {
        kind: PromptKind::InsertionPoint,
        system: "You are a careful legal document editor.".to_string(),
        user,
    }
}
