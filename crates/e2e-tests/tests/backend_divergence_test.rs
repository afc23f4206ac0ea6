//! Structured vs flat backend behavior.
//!
//! Both backends agree on per-document occurrence counts after a clean run
//! and both tolerate re-indexing a whole document. They differ in what a
//! merge can see: structured shards keep exact positions and union them,
//! flat shards keep per-line counts and replace a document's rows.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use e2e_tests::{generate_corpus, TestHarness};
use folio_types::{DocumentId, Position, ShardEncoding, WordEntry};

fn doc(id: u64) -> DocumentId {
    DocumentId::new(id).unwrap()
}

fn entry(lemma: &str, document: u64, positions: &[(u32, u32)]) -> WordEntry {
    let mut entry = WordEntry::new(lemma);
    for &(line, word) in positions {
        entry.record(doc(document), Position::new(line, word));
    }
    entry
}

fn counts_by_lemma(
    harness: &TestHarness,
    encoding: ShardEncoding,
) -> BTreeMap<String, BTreeMap<DocumentId, u32>> {
    harness
        .store(encoding)
        .scan()
        .unwrap()
        .entries
        .into_iter()
        .map(|e| {
            let per_doc = e.allocations.iter().map(|(d, a)| (*d, a.times)).collect();
            (e.lemma, per_doc)
        })
        .collect()
}

#[test]
fn test_backends_agree_on_counts_after_clean_run() {
    let harness = TestHarness::new();
    for (id, text) in generate_corpus(99, 8, 20) {
        harness.add_book(id, &text);
    }
    harness.index(ShardEncoding::Structured);
    harness.index(ShardEncoding::Flat);

    let structured = counts_by_lemma(&harness, ShardEncoding::Structured);
    let flat = counts_by_lemma(&harness, ShardEncoding::Flat);
    assert!(!structured.is_empty());
    assert_eq!(structured, flat);
}

#[test]
fn test_flat_backend_approximates_word_indexes() {
    let harness = TestHarness::new();
    harness.add_book(1, "sea and sky\nthe open sea, the sea");
    harness.index(ShardEncoding::Structured);
    harness.index(ShardEncoding::Flat);

    let exact = harness.engine(ShardEncoding::Structured).query("sea");
    let approx = harness.engine(ShardEncoding::Flat).query("sea");

    assert_eq!(
        exact[0].positions,
        vec![Position::new(1, 1), Position::new(2, 3), Position::new(2, 5)]
    );
    // Same lines and counts, word indexes renumbered from 1 per line
    assert_eq!(
        approx[0].positions,
        vec![Position::new(1, 1), Position::new(2, 1), Position::new(2, 2)]
    );
    assert_eq!(exact[0].total_occurrences, approx[0].total_occurrences);
}

/// Two partial merges for the same document: structured unions the
/// positions, flat keeps only the latest rows for that document.
#[test]
fn test_partial_merges_of_one_document_diverge() {
    let harness = TestHarness::new();
    let first = entry("whale", 7, &[(3, 2)]);
    let second = entry("whale", 7, &[(3, 2), (8, 1)]);
    let third = entry("whale", 7, &[(8, 1)]);

    let structured = harness.store(ShardEncoding::Structured);
    let flat = harness.store(ShardEncoding::Flat);
    for incoming in [&first, &second, &third] {
        structured.merge("whale", incoming).unwrap();
        flat.merge("whale", incoming).unwrap();
    }

    let s = structured.get("whale").unwrap().unwrap();
    let s_alloc = s.allocation(doc(7)).unwrap();
    assert_eq!(s_alloc.times, 2);
    assert_eq!(
        s_alloc.positions.iter().copied().collect::<Vec<_>>(),
        vec![Position::new(3, 2), Position::new(8, 1)]
    );

    let f = flat.get("whale").unwrap().unwrap();
    let f_alloc = f.allocation(doc(7)).unwrap();
    assert_eq!(f_alloc.times, 1);
    assert_eq!(
        f_alloc.positions.iter().copied().collect::<Vec<_>>(),
        vec![Position::new(8, 1)]
    );

    s.check_invariants().unwrap();
    f.check_invariants().unwrap();
}

/// Merging the same document twice is a no-op on both backends.
#[test]
fn test_same_document_twice_is_idempotent_on_both() {
    let harness = TestHarness::new();
    let incoming = entry("whale", 7, &[(3, 2)]);

    for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
        let store = harness.store(encoding);
        store.merge("whale", &incoming).unwrap();
        let once = harness.shard_snapshot(encoding);
        store.merge("whale", &incoming).unwrap();
        assert_eq!(harness.shard_snapshot(encoding), once, "{} backend", encoding);

        let stored = store.get("whale").unwrap().unwrap();
        let allocation = stored.allocation(doc(7)).unwrap();
        assert_eq!(allocation.times, 1);
        assert_eq!(
            allocation.positions.iter().copied().collect::<Vec<_>>(),
            vec![Position::new(3, 2)]
        );
        assert_eq!(stored.total, 1);
    }
}

#[test]
fn test_changed_document_text_on_reindex() {
    // A document edited between runs and re-indexed: structured keeps the
    // old positions alongside the new, flat reflects only the new text.
    let harness = TestHarness::new();
    harness.add_book(1, "whale");
    harness.index(ShardEncoding::Structured);
    harness.index(ShardEncoding::Flat);

    harness.add_book(1, "the\nwhale");
    harness.set_checkpoint(ShardEncoding::Structured, 0);
    harness.set_checkpoint(ShardEncoding::Flat, 0);
    harness.index(ShardEncoding::Structured);
    harness.index(ShardEncoding::Flat);

    let structured = harness.engine(ShardEncoding::Structured).query("whale");
    let flat = harness.engine(ShardEncoding::Flat).query("whale");
    assert_eq!(structured[0].total_occurrences, 2);
    assert_eq!(flat[0].total_occurrences, 1);
    assert_eq!(flat[0].positions, vec![Position::new(2, 1)]);
}
