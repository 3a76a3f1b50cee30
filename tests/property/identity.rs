//! Property-based tests for item identity determinism.

use mender::cache::cache_key;
use mender::item::{compute_item_id, ErrorCategory};
use proptest::prelude::*;

/// Hashing the same (file, line, message) triple twice yields the same id.
#[test]
fn item_id_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(any::<String>(), any::<u32>(), any::<String>()),
            |(file, line, message)| {
                let a = compute_item_id(&file, line, &message);
                let b = compute_item_id(&file, line, &message);
                assert_eq!(a, b);

                // Ids are 32-byte blake3 digests, hex-encoded.
                assert_eq!(a.len(), 64);
                Ok(())
            },
        )
        .unwrap();
}

/// Distinct triples produce distinct ids (collisions aside).
#[test]
fn item_id_distinguishes_triples_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                any::<String>(),
                any::<u32>(),
                any::<String>(),
                any::<String>(),
            ),
            |(file, line, message, other_message)| {
                prop_assume!(message != other_message);
                let a = compute_item_id(&file, line, &message);
                let b = compute_item_id(&file, line, &other_message);
                assert_ne!(a, b);
                Ok(())
            },
        )
        .unwrap();
}

/// Cache keys are stable for identical content and distinct otherwise.
#[test]
fn cache_key_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(any::<String>(), any::<String>()),
            |(message, file)| {
                let a = cache_key(&message, &ErrorCategory::Typescript, &file);
                let b = cache_key(&message, &ErrorCategory::Typescript, &file);
                assert_eq!(a, b);

                let other = cache_key(&message, &ErrorCategory::Svelte, &file);
                assert_ne!(a, other);
                Ok(())
            },
        )
        .unwrap();
}
