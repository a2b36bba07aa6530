//! # Concurrent Issuance
//!
//! Many threads issuing against one registry must produce exactly the
//! same ledger shape as sequential issuance: dense identifiers, one
//! winner per contested content reference, and a valid event chain.

use std::collections::BTreeSet;
use std::sync::Arc;

use certreg_core::{AccountId, CertificateId, Timestamp};
use certreg_engine::{
    CertificateRegistry, CertificateRequest, ErrorKind, EventRecord, ManualClock, RegistryConfig,
};
use parking_lot::Mutex;

fn account(n: u8) -> AccountId {
    AccountId::from_bytes([n; 20])
}

fn registry() -> CertificateRegistry {
    let clock = ManualClock::new(Timestamp::parse("2026-06-01T12:00:00Z").unwrap());
    CertificateRegistry::builder(RegistryConfig::new(account(0xad)))
        .clock(clock)
        .build()
        .unwrap()
}

fn request(recipient: u8, content_ref: String) -> CertificateRequest {
    CertificateRequest {
        recipient: account(recipient),
        recipient_name: "Recipient".into(),
        course_name: "Course".into(),
        grade: String::new(),
        content_ref: content_ref.into(),
        completion_date: Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
        cert_type: String::new(),
    }
}

const THREADS: u8 = 8;
const PER_THREAD: usize = 25;

#[test]
fn parallel_issuers_get_dense_unique_ids() {
    let registry = registry();
    for t in 1..=THREADS {
        registry.register_institution(&account(t), "Institution", "").unwrap();
    }

    let minted: Vec<Vec<CertificateId>> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=THREADS)
            .map(|t| {
                let registry = registry.clone();
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| {
                            registry
                                .issue_certificate(
                                    &account(t),
                                    request(100 + t, format!("Qm-{t}-{i}")),
                                )
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let total = THREADS as u64 * PER_THREAD as u64;
    assert_eq!(registry.get_total_certificates(), total);

    let all: BTreeSet<u64> = minted.iter().flatten().map(|id| id.get()).collect();
    assert_eq!(all, (1..=total).collect::<BTreeSet<_>>());

    // Each thread observes its own ids in increasing order.
    for ids in &minted {
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
    for t in 1..=THREADS {
        assert_eq!(
            registry.get_holder_certificates(&account(100 + t)),
            minted[usize::from(t - 1)]
        );
    }
    assert_eq!(registry.snapshot().verify_indexes(), Ok(()));
    assert!(registry.verify_event_chain().chain_valid);
}

#[test]
fn contested_reference_has_exactly_one_winner() {
    let registry = registry();
    for t in 1..=THREADS {
        registry.register_institution(&account(t), "Institution", "").unwrap();
    }

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=THREADS)
            .map(|t| {
                let registry = registry.clone();
                s.spawn(move || {
                    registry.issue_certificate(&account(t), request(100, "Qm-contested".into()))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::DuplicateReference));
    assert_eq!(registry.get_total_certificates(), 1);
}

#[test]
fn readers_never_see_partial_batches() {
    let registry = registry();
    let issuer = account(1);
    registry.register_institution(&issuer, "MIT", "").unwrap();

    std::thread::scope(|s| {
        let writer = registry.clone();
        s.spawn(move || {
            for round in 0..20 {
                let batch: Vec<CertificateRequest> = (0..5)
                    .map(|i| request(50, format!("Qm-{round}-{i}")))
                    .collect();
                writer.batch_issue_certificates(&issuer, batch.into()).unwrap();
            }
        });

        for _ in 0..4 {
            let reader = registry.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let state = reader.snapshot();
                    assert_eq!(state.last_id().get() % 5, 0, "observed a partial batch");
                    assert_eq!(state.verify_indexes(), Ok(()));
                }
            });
        }
    });

    assert_eq!(registry.get_total_certificates(), 100);
}

#[test]
fn observers_see_every_committed_event() {
    let registry = registry();
    let seen: Arc<Mutex<Vec<u64>>> = Arc::default();
    let sink = Arc::clone(&seen);
    registry.subscribe(Arc::new(move |record: &EventRecord| {
        sink.lock().push(record.sequence);
    }));

    for t in 1..=THREADS {
        registry.register_institution(&account(t), "Institution", "").unwrap();
    }
    std::thread::scope(|s| {
        for t in 1..=THREADS {
            let registry = registry.clone();
            s.spawn(move || {
                for i in 0..10 {
                    registry
                        .issue_certificate(&account(t), request(100, format!("Qm-{t}-{i}")))
                        .unwrap();
                }
            });
        }
    });

    let mut sequences = seen.lock().clone();
    let expected = u64::from(THREADS) + u64::from(THREADS) * 10;
    assert_eq!(sequences.len() as u64, expected);
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=expected).collect::<Vec<_>>());
}
