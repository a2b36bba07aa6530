//! # Registry Lifecycle Scenarios
//!
//! End-to-end walks through the public `CertificateRegistry` API:
//! registration, issuance, duplicate and unauthorized rejection,
//! institution revocation, and soft lookups by content reference.

use certreg_core::{AccountId, CertificateId, ContentRef, Timestamp};
use certreg_engine::{
    BatchIssueRequest, Certificate, CertificateRegistry, CertificateRequest, ErrorKind, ManualClock,
    RegistryConfig, RegistryEvent,
};

fn account(n: u8) -> AccountId {
    AccountId::from_bytes([n; 20])
}

const ADMIN: u8 = 0xad;
const INSTITUTION_A: u8 = 0x0a;
const OUTSIDER_B: u8 = 0x0b;
const RECIPIENT_R: u8 = 0x42;

fn registry() -> (CertificateRegistry, ManualClock) {
    let clock = ManualClock::new(Timestamp::parse("2026-06-01T12:00:00Z").unwrap());
    let registry = CertificateRegistry::builder(RegistryConfig::new(account(ADMIN)))
        .clock(clock.clone())
        .build()
        .unwrap();
    (registry, clock)
}

fn request(recipient: u8, content_ref: &str) -> CertificateRequest {
    CertificateRequest {
        recipient: account(recipient),
        recipient_name: "Ada Lovelace".into(),
        course_name: "Analytical Engines".into(),
        grade: "A".into(),
        content_ref: content_ref.into(),
        completion_date: Timestamp::parse("2026-05-30T00:00:00Z").unwrap(),
        cert_type: "diploma".into(),
    }
}

// ---------------------------------------------------------------------------
// 1. Happy path
// ---------------------------------------------------------------------------

#[test]
fn register_issue_and_query() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);

    registry.register_institution(&a, "MIT", "reg@mit.edu").unwrap();
    let stats = registry.get_institution_stats(&a);
    assert!(stats.authorized);
    assert_eq!(stats.issued_count, 0);

    let id = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm123")).unwrap();
    assert_eq!(id, CertificateId::new(1));
    assert_eq!(registry.get_total_certificates(), 1);
    assert_eq!(
        registry.get_holder_certificates(&account(RECIPIENT_R)),
        vec![CertificateId::new(1)]
    );
    assert_eq!(registry.get_institution_stats(&a).issued_count, 1);

    let cert = registry.verify_certificate(id).unwrap();
    assert!(cert.valid);
    assert_eq!(cert.institution_name, "MIT");
    assert_eq!(cert.issuer, a);
    assert_eq!(registry.owner_of(id), Some(account(RECIPIENT_R)));
}

// ---------------------------------------------------------------------------
// 2. Rejections leave state untouched
// ---------------------------------------------------------------------------

#[test]
fn duplicate_reference_is_rejected() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();
    registry.issue_certificate(&a, request(RECIPIENT_R, "Qm123")).unwrap();

    let err = registry
        .issue_certificate(&a, request(RECIPIENT_R, "Qm123"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateReference);
    assert_eq!(registry.get_total_certificates(), 1);
    assert_eq!(registry.get_institution_stats(&a).issued_count, 1);
}

#[test]
fn unregistered_account_cannot_issue() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();
    registry.issue_certificate(&a, request(RECIPIENT_R, "Qm123")).unwrap();

    let err = registry
        .issue_certificate(&account(OUTSIDER_B), request(RECIPIENT_R, "Qm456"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    assert_eq!(registry.get_total_certificates(), 1);
}

#[test]
fn revoked_institution_cannot_issue_but_history_survives() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();
    let id = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm123")).unwrap();

    registry.revoke_institution(&account(ADMIN), &a).unwrap();
    assert!(!registry.get_institution_stats(&a).authorized);

    let err = registry
        .issue_certificate(&a, request(RECIPIENT_R, "Qm456"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);

    let cert = registry.verify_certificate(id).unwrap();
    assert!(cert.valid);
    assert_eq!(cert.institution_name, "MIT");
}

#[test]
fn unknown_content_ref_is_soft_not_found() {
    let (registry, _) = registry();
    let lookup = registry.verify_certificate_by_content_ref(&ContentRef::from("unknownHash"));
    assert!(!lookup.exists);
    assert!(lookup.id.is_none());
    assert_eq!(lookup.certificate, Certificate::default());
}

#[test]
fn completion_date_in_the_future_is_rejected() {
    let (registry, clock) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();

    let mut req = request(RECIPIENT_R, "Qm-future");
    req.completion_date = Timestamp::parse("2026-06-02T00:00:00Z").unwrap();
    let err = registry.issue_certificate(&a, req.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    clock.advance(2 * 86_400);
    registry.issue_certificate(&a, req).unwrap();
}

// ---------------------------------------------------------------------------
// 3. Certificate revocation
// ---------------------------------------------------------------------------

#[test]
fn issuer_and_admin_may_revoke_others_may_not() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    let c = account(0x0c);
    registry.register_institution(&a, "MIT", "").unwrap();
    registry.register_institution(&c, "Caltech", "").unwrap();
    let first = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm1")).unwrap();
    let second = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm2")).unwrap();

    let err = registry.revoke_certificate(&c, first).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    let err = registry.revoke_certificate(&account(RECIPIENT_R), first).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);

    registry.revoke_certificate(&a, first).unwrap();
    registry.revoke_certificate(&account(ADMIN), second).unwrap();
    assert!(!registry.verify_certificate(first).unwrap().valid);
    assert!(!registry.verify_certificate(second).unwrap().valid);

    // Holder index and content lookup are unaffected by revocation.
    assert_eq!(registry.get_holder_certificates(&account(RECIPIENT_R)).len(), 2);
    let lookup = registry.verify_certificate_by_content_ref(&"Qm1".into());
    assert!(lookup.exists);
    assert!(!lookup.certificate.valid);
}

#[test]
fn revoking_unknown_certificate_is_not_found() {
    let (registry, _) = registry();
    let err = registry
        .revoke_certificate(&account(ADMIN), CertificateId::new(99))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// 4. Batch issuance
// ---------------------------------------------------------------------------

#[test]
fn batch_assigns_consecutive_ids() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();
    registry.issue_certificate(&a, request(RECIPIENT_R, "Qm0")).unwrap();

    let batch: BatchIssueRequest = (1..=3)
        .map(|i| request(0x50 + i, &format!("Qm-batch-{i}")))
        .collect::<Vec<_>>()
        .into();
    let ids = registry.batch_issue_certificates(&a, batch).unwrap();
    assert_eq!(
        ids,
        vec![
            CertificateId::new(2),
            CertificateId::new(3),
            CertificateId::new(4)
        ]
    );
    assert_eq!(registry.get_institution_stats(&a).issued_count, 4);
}

#[test]
fn batch_with_internal_duplicate_mints_nothing() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();

    let batch: BatchIssueRequest = vec![
        request(0x51, "Qm-x"),
        request(0x52, "Qm-y"),
        request(0x53, "Qm-x"),
    ]
    .into();
    let err = registry.batch_issue_certificates(&a, batch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateReference);
    assert_eq!(registry.get_total_certificates(), 0);
    assert!(!registry.verify_certificate_by_content_ref(&"Qm-y".into()).exists);
    assert_eq!(registry.get_institution_stats(&a).issued_count, 0);
}

#[test]
fn batch_size_limits() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();

    let none = registry
        .batch_issue_certificates(&a, BatchIssueRequest::default())
        .unwrap();
    assert!(none.is_empty());

    let oversized: BatchIssueRequest = (0..51)
        .map(|i| request(0x60, &format!("Qm-big-{i}")))
        .collect::<Vec<_>>()
        .into();
    let err = registry.batch_issue_certificates(&a, oversized).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let full: BatchIssueRequest = (0..50)
        .map(|i| request(0x60, &format!("Qm-ok-{i}")))
        .collect::<Vec<_>>()
        .into();
    assert_eq!(registry.batch_issue_certificates(&a, full).unwrap().len(), 50);
}

#[test]
fn batch_with_mismatched_arrays_is_invalid() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();

    let mut batch: BatchIssueRequest = vec![request(0x51, "Qm-a"), request(0x52, "Qm-b")].into();
    batch.grades.pop();
    let err = registry.batch_issue_certificates(&a, batch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ---------------------------------------------------------------------------
// 5. Events
// ---------------------------------------------------------------------------

#[test]
fn events_record_the_full_history() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    registry.register_institution(&a, "MIT", "").unwrap();
    let id = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm1")).unwrap();
    registry.revoke_certificate(&a, id).unwrap();
    registry.revoke_institution(&account(ADMIN), &a).unwrap();

    let names: Vec<&str> = registry
        .events()
        .iter()
        .map(|r| r.event.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "institution_authorized",
            "certificate_issued",
            "certificate_revoked",
            "institution_revoked"
        ]
    );

    let for_cert = registry.events_for_certificate(id);
    assert_eq!(for_cert.len(), 2);
    assert!(matches!(
        for_cert[1].event,
        RegistryEvent::CertificateRevoked { revoked_by, .. } if revoked_by == a
    ));
    assert!(registry.verify_event_chain().chain_valid);
}

#[test]
fn holder_history_lists_every_issuance_to_them() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    let other = account(0x0c);
    registry.register_institution(&a, "MIT", "").unwrap();
    registry.register_institution(&other, "ETH", "").unwrap();

    let first = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm1")).unwrap();
    registry.issue_certificate(&a, request(0x43, "Qm2")).unwrap();
    let batch: BatchIssueRequest = vec![request(RECIPIENT_R, "Qm3")].into();
    let third = registry.batch_issue_certificates(&other, batch).unwrap()[0];

    let held = registry.events_for_holder(&account(RECIPIENT_R));
    let ids: Vec<_> = held.iter().filter_map(|r| r.event.certificate_id()).collect();
    assert_eq!(ids, vec![first, third]);
    assert!(held.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert!(matches!(
        held[1].event,
        RegistryEvent::CertificateIssued { issuer, .. } if issuer == other
    ));
    assert_eq!(
        registry.get_holder_certificates(&account(RECIPIENT_R)),
        ids
    );
    assert!(registry.events_for_holder(&a).is_empty());
}

#[test]
fn failed_operations_emit_nothing() {
    let (registry, _) = registry();
    let a = account(INSTITUTION_A);
    let _ = registry.issue_certificate(&a, request(RECIPIENT_R, "Qm1"));
    let _ = registry.revoke_institution(&a, &a);
    assert!(registry.events().is_empty());
}
