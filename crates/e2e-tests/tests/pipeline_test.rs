//! End-to-end pipeline tests for folio.
//!
//! Books on disk -> index builder -> shards -> query engine, for both
//! backends.

use pretty_assertions::assert_eq;

use e2e_tests::{count_occurrences, generate_corpus, TestHarness};
use folio_storage::append_metadata;
use folio_types::{DocumentId, DocumentMetadata, Position, ShardEncoding};

const BOTH: [ShardEncoding; 2] = [ShardEncoding::Structured, ShardEncoding::Flat];

fn doc(id: u64) -> DocumentId {
    DocumentId::new(id).unwrap()
}

/// Two one-line books share "whale" at line 1, word 2.
#[test]
fn test_two_document_scenario() {
    let harness = TestHarness::new();
    harness.add_book(1, "the whale swims");
    harness.add_book(2, "the whale dives");

    for encoding in BOTH {
        let report = harness.index(encoding);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.checkpoint, 2);

        let hits = harness.engine(encoding).query("whale");
        let summary: Vec<(u64, u32, Vec<Position>)> = hits
            .iter()
            .map(|h| (h.document_id.get(), h.total_occurrences, h.positions.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, 1, vec![Position::new(1, 2)]),
                (2, 1, vec![Position::new(1, 2)]),
            ],
            "{} backend",
            encoding
        );
    }
}

#[test]
fn test_query_is_case_insensitive() {
    let harness = TestHarness::new();
    harness.add_book(1, "Call me Ishmael. The WHALE, the whale!");
    harness.index(ShardEncoding::Structured);

    let engine = harness.engine(ShardEncoding::Structured);
    assert_eq!(engine.query("Whale"), engine.query("whale"));
    assert_eq!(engine.query("WHALE").len(), 1);
    assert_eq!(engine.query("ishmael"), engine.query("Ishmael."));
}

#[test]
fn test_results_join_metadata_and_order_by_id() {
    let harness = TestHarness::new();
    for id in [30, 4, 100, 7] {
        harness.add_book(id, "a sea voyage");
    }
    let metadata = harness.settings.metadata_file();
    append_metadata(
        &metadata,
        &DocumentMetadata::new(doc(7), "Moby Dick").with_author("Herman Melville"),
    )
    .unwrap();
    append_metadata(&metadata, &DocumentMetadata::new(doc(100), "Typee")).unwrap();

    harness.index(ShardEncoding::Structured);
    let hits = harness.engine(ShardEncoding::Structured).query("voyage");

    let ids: Vec<u64> = hits.iter().map(|h| h.document_id.get()).collect();
    assert_eq!(ids, vec![4, 7, 30, 100]);
    let titles: Vec<Option<&str>> = hits
        .iter()
        .map(|h| h.metadata.as_ref().map(|m| m.title.as_str()))
        .collect();
    assert_eq!(titles, vec![None, Some("Moby Dick"), None, Some("Typee")]);
}

#[test]
fn test_rejected_tokens_are_not_indexed() {
    let harness = TestHarness::new();
    harness.add_book(1, "con CON prn aux nul lpt1 com9 1851 _private x2 whale");
    harness.index(ShardEncoding::Structured);

    let engine = harness.engine(ShardEncoding::Structured);
    assert_eq!(engine.stats().lemmas, 1);
    for term in ["con", "prn", "aux", "nul", "1851", "_private"] {
        assert!(engine.query(term).is_empty(), "{} should not be indexed", term);
    }
    // Word index counts rejected tokens too
    assert_eq!(engine.query("whale")[0].positions, vec![Position::new(1, 11)]);
}

#[test]
fn test_diacritics_fold_to_ascii() {
    let harness = TestHarness::new();
    harness.add_book(1, "un café au lait");
    harness.index(ShardEncoding::Flat);

    let engine = harness.engine(ShardEncoding::Flat);
    assert_eq!(engine.query("cafe").len(), 1);
    assert_eq!(engine.query("CAFÉ"), engine.query("cafe"));
    assert!(harness
        .settings
        .shard_root(ShardEncoding::Flat)
        .join("c/ca/cafe.tsv")
        .is_file());
}

/// Query counts match a brute-force count over the raw text, for both
/// backends.
#[test]
fn test_generated_corpus_counts_match_text() {
    let harness = TestHarness::new();
    let corpus = generate_corpus(42, 12, 30);
    for (id, text) in &corpus {
        harness.add_book(*id, text);
    }

    for encoding in BOTH {
        harness.index(encoding);
        let engine = harness.engine(encoding);
        for lemma in ["whale", "ahab", "sea", "cafe", "the"] {
            let expected = count_occurrences(&harness.normalizer, &corpus, lemma);
            let actual: std::collections::BTreeMap<DocumentId, u32> = engine
                .query(lemma)
                .into_iter()
                .map(|h| (h.document_id, h.total_occurrences))
                .collect();
            assert_eq!(actual, expected, "{} backend, lemma {}", encoding, lemma);
        }
    }
}
