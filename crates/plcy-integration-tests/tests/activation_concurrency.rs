//! Concurrent writers: racing mutations for the same document either
//! land whole or lose with a conflict, and the
//! one-active-version-per-locale invariant holds throughout.

use std::sync::{Arc, Barrier};
use std::thread;

use plcy_core::{ActorId, DocumentId, Locale, VersionId};
use plcy_service::{
    CreateDocumentRequest, CreateVersionRequest, PolicyService,
};
use plcy_state::VersionStatus;
use plcy_store::{Commit, InMemoryPolicyStore, PolicyStore, StoreError};

fn admin(name: &str) -> ActorId {
    ActorId::new(name).unwrap()
}

fn seed(service: &PolicyService<InMemoryPolicyStore>) -> (DocumentId, VersionId, VersionId) {
    let actor = admin("seed-admin");
    let doc_id = service
        .create_document(
            CreateDocumentRequest {
                slug: "privacy-notice".to_string(),
                title: "Privacy Notice".to_string(),
                category: "privacy".to_string(),
                default_locale: "en".to_string(),
                ..Default::default()
            },
            &actor,
        )
        .unwrap()
        .document
        .id;

    let mut ids = Vec::new();
    for content in ["First edition.", "Second edition."] {
        let (id, _) = service
            .create_version(
                doc_id,
                CreateVersionRequest {
                    locale: "en".to_string(),
                    content: content.to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .unwrap();
        service
            .transition_version(id, VersionStatus::InReview, &actor)
            .unwrap();
        service
            .transition_version(id, VersionStatus::Approved, &actor)
            .unwrap();
        service.publish_version(id, None, &actor).unwrap();
        ids.push(id);
    }
    (doc_id, ids[0], ids[1])
}

/// Deterministic reproduction of the race: two writers prepare against
/// the same token snapshot, the second commit must be rejected whole.
#[test]
fn stale_token_commit_rejected_atomically() {
    let service = PolicyService::in_memory();
    let (doc_id, v1, v2) = seed(&service);
    let store = service.store();
    let locale = Locale::new("en").unwrap();

    let token = store.activation_token(doc_id, &locale).unwrap();

    let mut first = store.version(v1).unwrap().unwrap();
    first.mark_active();
    store
        .commit(
            Commit::new()
                .with_version(first)
                .expect_token(doc_id, locale.clone(), token),
        )
        .unwrap();

    let mut second = store.version(v2).unwrap().unwrap();
    second.mark_active();
    let err = store
        .commit(
            Commit::new()
                .with_version(second)
                .expect_token(doc_id, locale.clone(), token),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::TokenConflict { .. }));

    // The loser's write set left no trace.
    assert!(store.version(v1).unwrap().unwrap().active);
    assert!(!store.version(v2).unwrap().unwrap().active);
    assert_eq!(store.activation_token(doc_id, &locale).unwrap(), token + 1);
}

/// Race two service-level activations of different versions for the same
/// locale. Whatever interleaving occurs, the end state has exactly one
/// active version, and no call reports anything other than success or a
/// conflict.
#[test]
fn racing_activations_leave_exactly_one_active() {
    for _ in 0..20 {
        let service = PolicyService::in_memory();
        let (doc_id, v1, v2) = seed(&service);

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for (version_id, actor) in [(v1, "admin-a"), (v2, "admin-b")] {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let actor = admin(actor);
            handles.push(thread::spawn(move || {
                barrier.wait();
                service.activate_version(version_id, &actor)
            }));
        }

        let mut conflicts = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => {}
                Err(err) => {
                    assert_eq!(err.kind(), "CONFLICT");
                    conflicts += 1;
                }
            }
        }
        // Both may serialize cleanly (second supersedes first), or the
        // loser conflicts; either way never both fail.
        assert!(conflicts <= 1);

        let versions = service.store().versions_for(doc_id).unwrap();
        let active: Vec<_> = versions.iter().filter(|v| v.active).collect();
        assert_eq!(
            active.len(),
            1,
            "exactly one version must end up active, got {}",
            active.len()
        );
    }
}

/// Race activations for two different locales of the same document. The
/// locales do not contend for the same marker, so whenever both succeed
/// the document must end up with both markers set and its
/// `active_version_id` naming the default-locale version; a stale writer
/// may only lose with a conflict, never roll the other locale back.
#[test]
fn racing_locales_never_roll_back_the_default_pointer() {
    for _ in 0..40 {
        let service = PolicyService::in_memory();
        let actor = admin("seed-admin");
        let doc_id = service
            .create_document(
                CreateDocumentRequest {
                    slug: "cookie-policy".to_string(),
                    title: "Cookie Policy".to_string(),
                    category: "cookie".to_string(),
                    default_locale: "en".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .unwrap()
            .document
            .id;

        let mut ids = Vec::new();
        for locale in ["en", "fi"] {
            let (id, _) = service
                .create_version(
                    doc_id,
                    CreateVersionRequest {
                        locale: locale.to_string(),
                        content: "We use cookies.".to_string(),
                        ..Default::default()
                    },
                    &actor,
                )
                .unwrap();
            service
                .transition_version(id, VersionStatus::InReview, &actor)
                .unwrap();
            service
                .transition_version(id, VersionStatus::Approved, &actor)
                .unwrap();
            service.publish_version(id, None, &actor).unwrap();
            ids.push(id);
        }
        let (en, fi) = (ids[0], ids[1]);

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for (version_id, actor) in [(en, "admin-a"), (fi, "admin-b")] {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let actor = admin(actor);
            handles.push(thread::spawn(move || {
                barrier.wait();
                service.activate_version(version_id, &actor)
            }));
        }
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        for result in &results {
            if let Err(err) = result {
                assert_eq!(err.kind(), "CONFLICT");
            }
        }

        let store = service.store();
        let document = store.document(doc_id).unwrap().unwrap();
        if results[0].is_ok() {
            // The English activation landed; the Finnish one, whatever its
            // fate, must not have clobbered the default-locale pointer.
            assert!(store.version(en).unwrap().unwrap().active);
            assert_eq!(document.active_version_id, Some(en));
            assert_eq!(document.status, plcy_state::DocumentStatus::Active);
        }
        if results[1].is_ok() {
            assert!(store.version(fi).unwrap().unwrap().active);
            assert_eq!(document.status, plcy_state::DocumentStatus::Active);
        }
    }
}

/// Archival of the active version races against activation of another:
/// the invariant (at most one active per locale) must survive.
#[test]
fn racing_archive_and_activate_keep_invariant() {
    for _ in 0..20 {
        let service = PolicyService::in_memory();
        let (doc_id, v1, v2) = seed(&service);
        service
            .activate_version(v1, &admin("seed-admin"))
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));

        let archiver = {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.archive_version(v1, &admin("admin-a"))
            })
        };
        let activator = {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.activate_version(v2, &admin("admin-b"))
            })
        };

        for result in [archiver.join().unwrap(), activator.join().unwrap()] {
            if let Err(err) = result {
                assert_eq!(err.kind(), "CONFLICT");
            }
        }

        let versions = service.store().versions_for(doc_id).unwrap();
        let active: Vec<_> = versions.iter().filter(|v| v.active).collect();
        assert!(
            active.len() <= 1,
            "at most one active version per locale, got {}",
            active.len()
        );
        // An archived version may never carry the marker.
        assert!(versions
            .iter()
            .all(|v| !(v.active && v.status == VersionStatus::Archived)));
    }
}

/// A document-field update races a version publication for the same
/// document. Neither writer may clobber the other's committed state: a
/// call either lands whole or loses with a conflict.
#[test]
fn racing_document_update_and_publish_lose_no_writes() {
    for _ in 0..20 {
        let service = PolicyService::in_memory();
        let actor = admin("seed-admin");
        let doc_id = service
            .create_document(
                CreateDocumentRequest {
                    slug: "dpa".to_string(),
                    title: "Data Processing Agreement".to_string(),
                    category: "data_processing".to_string(),
                    default_locale: "en".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .unwrap()
            .document
            .id;
        let (version_id, _) = service
            .create_version(
                doc_id,
                CreateVersionRequest {
                    locale: "en".to_string(),
                    content: "Processing terms.".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .unwrap();
        service
            .transition_version(version_id, VersionStatus::InReview, &actor)
            .unwrap();
        service
            .transition_version(version_id, VersionStatus::Approved, &actor)
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let updater = {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.update_document(
                    doc_id,
                    plcy_service::DocumentPatch {
                        title: Some("DPA (2026 revision)".to_string()),
                        ..Default::default()
                    },
                    &admin("admin-a"),
                )
            })
        };
        let publisher = {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.publish_version(version_id, None, &admin("admin-b"))
            })
        };

        let update_result = updater.join().unwrap();
        let publish_result = publisher.join().unwrap();
        for result in [&update_result, &publish_result] {
            if let Err(err) = result {
                assert_eq!(err.kind(), "CONFLICT");
            }
        }

        let store = service.store();
        let document = store.document(doc_id).unwrap().unwrap();
        if update_result.is_ok() {
            assert_eq!(document.title, "DPA (2026 revision)");
        } else {
            assert_eq!(document.title, "Data Processing Agreement");
        }
        if publish_result.is_ok() {
            assert_eq!(
                store.version(version_id).unwrap().unwrap().status,
                VersionStatus::Published
            );
        }
    }
}
