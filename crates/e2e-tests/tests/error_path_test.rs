//! Error path E2E tests for folio.
//!
//! Malformed shards and metadata are skipped on load; a missing index root
//! fails fast; a corrupt shard is never overwritten by a merge.

use std::fs;

use pretty_assertions::assert_eq;

use e2e_tests::TestHarness;
use folio_indexing::IndexingError;
use folio_query::{QueryEngine, QueryError};
use folio_storage::{CheckpointStore, CsvMetadataStore, MetadataStore, METADATA_HEADER};
use folio_types::{DocumentId, ShardEncoding};

#[test]
fn test_missing_index_root_fails_fast() {
    let harness = TestHarness::new();
    for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
        let result = QueryEngine::load(
            harness.store(encoding).as_ref(),
            std::sync::Arc::new(CsvMetadataStore::empty()),
            harness.normalizer.clone(),
        );
        assert!(matches!(result, Err(QueryError::IndexRootMissing(_))));
    }
}

#[test]
fn test_malformed_shards_do_not_block_loading() {
    let harness = TestHarness::new();
    harness.add_book(1, "the whale\nthe sea");
    harness.index(ShardEncoding::Structured);
    harness.index(ShardEncoding::Flat);

    let json = harness.settings.shard_root(ShardEncoding::Structured).join("s/se/sea.json");
    fs::write(&json, "{\"word\": \"sea\", \"tot").unwrap();
    let tsv = harness.settings.shard_root(ShardEncoding::Flat).join("s/se/sea.tsv");
    fs::write(&tsv, "garbage header\n1\t1\t1\n").unwrap();

    for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
        let engine = harness.engine(encoding);
        assert_eq!(engine.stats().malformed.len(), 1, "{} backend", encoding);
        assert!(engine.query("sea").is_empty());
        assert_eq!(engine.query("whale").len(), 1);
    }
}

#[test]
fn test_corrupt_shard_halts_indexing_without_data_loss() {
    let harness = TestHarness::new();
    harness.add_book(1, "the whale");
    harness.index(ShardEncoding::Structured);

    let shard = harness.settings.shard_root(ShardEncoding::Structured).join("w/wh/whale.json");
    fs::write(&shard, "not json").unwrap();

    harness.add_book(2, "a whale");
    let err = harness.builder(ShardEncoding::Structured).run().unwrap_err();
    assert!(matches!(err, IndexingError::Shard { .. }));
    assert_eq!(fs::read_to_string(&shard).unwrap(), "not json");
    assert_eq!(harness.checkpoint(ShardEncoding::Structured).read(), 1);
}

#[test]
fn test_malformed_metadata_rows_are_skipped() {
    let harness = TestHarness::new();
    fs::write(
        harness.settings.metadata_file(),
        format!(
            "{}\n\"1\",\"Moby Dick\",\"Herman Melville\",\"1851\",\"\",\"English\"\nnot,a,valid,row,at,all\n\"2\",\"Typee\"\n",
            METADATA_HEADER
        ),
    )
    .unwrap();

    let metadata = CsvMetadataStore::load(&harness.settings.metadata_file()).unwrap();
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata.skipped(), 1);
    assert_eq!(
        metadata.get(DocumentId::new(1).unwrap()).unwrap().release_date,
        "1851"
    );
}

#[test]
fn test_missing_books_directory_is_an_error() {
    let harness = TestHarness::new();
    fs::remove_dir(harness.books_dir()).unwrap();
    let err = harness.builder(ShardEncoding::Flat).run().unwrap_err();
    assert!(matches!(err, IndexingError::Source(_)));
}

#[test]
fn test_zero_padded_book_name_does_not_freeze_checkpoint() {
    let harness = TestHarness::new();
    harness.add_book(1, "call me ishmael");
    fs::write(harness.books_dir().join("007.txt"), "a harpoon").unwrap();
    harness.add_book(9, "the white whale");

    for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
        let report = harness.index(encoding);
        assert!(report.skipped.is_empty(), "{} backend", encoding);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.checkpoint, 9);

        let rerun = harness.index(encoding);
        assert_eq!(rerun.indexed, 0);
        assert!(harness.engine(encoding).query("harpoon").is_empty());
    }
}
