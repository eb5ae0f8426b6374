//! Safety Limits Integration Tests
//!
//! Tests for document/response limits, denylist patterns, and the
//! generation call budget.

use clausealign::core::{SafetyLimits, SafetyTracker, SafetyViolation};
use std::path::Path;

#[test]
fn test_max_document_bytes() {
    let limits = SafetyLimits {
        max_document_bytes: 100,
        ..Default::default()
    };

    assert!(limits.validate_document(&"x".repeat(50), None).is_ok());

    // Exactly at the limit is allowed
    assert!(limits.validate_document(&"x".repeat(100), None).is_ok());

    match limits.validate_document(&"x".repeat(200), None) {
        Err(SafetyViolation::MaxDocumentBytes { actual, limit }) => {
            assert_eq!(actual, 200);
            assert_eq!(limit, 100);
        }
        other => panic!("Expected MaxDocumentBytes violation, got {:?}", other),
    }
}

#[test]
fn test_max_response_bytes() {
    let limits = SafetyLimits {
        max_response_bytes: 100,
        ..Default::default()
    };

    assert!(limits.validate_response(&"y".repeat(50)).is_ok());

    match limits.validate_response(&"y".repeat(200)) {
        Err(SafetyViolation::MaxResponseBytes { actual, limit }) => {
            assert_eq!(actual, 200);
            assert_eq!(limit, 100);
        }
        other => panic!("Expected MaxResponseBytes violation, got {:?}", other),
    }
}

#[test]
fn test_denylist_blocks_secrets() {
    let limits = SafetyLimits::default();

    assert!(limits.is_denylisted(".env"));
    assert!(limits.is_denylisted(".env.production"));
    assert!(limits.is_denylisted("config/.env"));
    assert!(limits.is_denylisted("secrets.yaml"));
    assert!(limits.is_denylisted("deep/path/secrets-file"));
    assert!(limits.is_denylisted("aws-credential-file"));
    assert!(limits.is_denylisted("certs/ca.pem"));
    assert!(limits.is_denylisted("ssl/domain.key"));

    // **/secrets* only matches names starting with "secrets"
    assert!(!limits.is_denylisted("my-secrets-file"));
}

#[test]
fn test_denylist_allows_contracts() {
    let limits = SafetyLimits::default();

    assert!(!limits.is_denylisted("nda_a.txt"));
    assert!(!limits.is_denylisted("contracts/2024/supplier-agreement.md"));
    assert!(!limits.is_denylisted("Mutual NDA (final).txt"));
}

#[test]
fn test_validate_document_with_denylisted_path() {
    let limits = SafetyLimits::default();
    let text = "1. Confidentiality";

    assert!(limits
        .validate_document(text, Some(Path::new("contracts/nda.txt")))
        .is_ok());

    match limits.validate_document(text, Some(Path::new(".env.local"))) {
        Err(SafetyViolation::DenylistMatch { path }) => assert!(path.contains(".env.local")),
        other => panic!("Expected DenylistMatch violation, got {:?}", other),
    }
}

#[test]
fn test_generation_call_budget() {
    let limits = SafetyLimits {
        max_generation_calls: 3,
        ..Default::default()
    };

    let mut tracker = SafetyTracker::new();
    for _ in 0..3 {
        assert!(limits.check(&tracker).is_ok());
        tracker.record_call(100, 200);
    }

    match limits.check(&tracker) {
        Err(SafetyViolation::MaxGenerationCalls { actual, limit }) => {
            assert_eq!(actual, 3);
            assert_eq!(limit, 3);
        }
        other => panic!("Expected MaxGenerationCalls violation, got {:?}", other),
    }
    assert_eq!(tracker.prompt_bytes, 300);
    assert_eq!(tracker.response_bytes, 600);
}

#[test]
fn test_limits_from_yaml_fill_defaults() {
    let limits: SafetyLimits = serde_yaml::from_str("max_response_bytes: 4096\n").unwrap();
    assert_eq!(limits.max_response_bytes, 4096);
    assert_eq!(limits.max_generation_calls, 100);
    assert_eq!(limits.denylist_patterns.len(), 5);
}
