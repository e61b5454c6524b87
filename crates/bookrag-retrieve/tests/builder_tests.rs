mod common;

use std::fs;
use std::sync::Arc;

use bookrag_core::documents::Documents;
use bookrag_core::traits::VectorIndex;
use bookrag_core::Error;
use bookrag_embed::HashingEncoder;
use bookrag_retrieve::IndexBuilder;
use bookrag_vector::{Corpus, CorpusOrigin, CorpusStore, FlatL2Index};

use common::{fixture, hashing, FailingEncoder, ShortEncoder, DIM};

fn builder(config: &bookrag_core::config::RagConfig, encoder: Arc<dyn bookrag_core::traits::Encoder>) -> IndexBuilder {
    IndexBuilder::from_config(config, encoder).quiet()
}

#[test]
fn vectors_line_up_with_chunks_after_build_and_reload() {
    let (_dir, config) = fixture();
    let corpus = builder(&config, hashing()).build_from_dir(false).unwrap();
    assert_eq!(corpus.origin(), CorpusOrigin::Built);
    assert!(corpus.len() > 2, "fixture should produce several chunks");
    assert_eq!(corpus.index().len(), corpus.len());

    let encoder = HashingEncoder::new(DIM);
    for (id, chunk) in corpus.chunks().iter().enumerate() {
        assert_eq!(corpus.index().vector(id), Some(encoder.embed_text(&chunk.content).as_slice()));
    }

    let reloaded: Corpus = CorpusStore::from_config(&config).load().unwrap();
    assert_eq!(reloaded.chunks(), corpus.chunks());
    for id in 0..reloaded.len() {
        assert_eq!(reloaded.index().vector(id), corpus.index().vector(id));
    }
}

#[test]
fn chunks_follow_source_id_order() {
    let (_dir, config) = fixture();
    let corpus = builder(&config, hashing()).build_from_dir(false).unwrap();
    let sources: Vec<&str> = corpus.chunks().iter().map(|c| c.metadata.source.as_str()).collect();
    let first_cells = sources.iter().position(|s| *s == "biology/cells.txt").unwrap();
    assert!(sources[..first_cells].iter().all(|s| *s == "anatomy.txt"));
    assert!(sources[first_cells..].iter().all(|s| *s == "biology/cells.txt"));
}

#[test]
fn batching_does_not_change_vector_assignment() {
    let (_dir, config) = fixture();
    let small = builder(&config, hashing()).build_from_dir(true).unwrap();

    let mut wide = config.clone();
    wide.batch_size = 1000;
    let large = builder(&wide, hashing()).build_from_dir(true).unwrap();

    assert_eq!(small.chunks(), large.chunks());
    for id in 0..small.len() {
        assert_eq!(small.index().vector(id), large.index().vector(id));
    }
}

#[test]
fn existing_corpus_is_loaded_unless_forced() {
    let (_dir, config) = fixture();
    let first = builder(&config, hashing()).build_from_dir(false).unwrap();

    fs::write(config.textbooks_dir.join("physics.txt"), "Force equals mass times acceleration.").unwrap();

    let loaded = builder(&config, hashing()).build_from_dir(false).unwrap();
    assert_eq!(loaded.origin(), CorpusOrigin::Loaded);
    assert_eq!(loaded.len(), first.len());

    let rebuilt = builder(&config, hashing()).build_from_dir(true).unwrap();
    assert_eq!(rebuilt.origin(), CorpusOrigin::Built);
    assert_eq!(rebuilt.len(), first.len() + 1);
}

#[test]
fn in_memory_documents_can_be_built() {
    let (_dir, config) = fixture();
    let mut documents = Documents::new();
    documents.insert("b.txt".into(), "Second document. It has two sentences.".into());
    documents.insert("a.txt".into(), "First document.".into());

    let corpus = builder(&config, hashing()).build(&documents, true).unwrap();
    assert_eq!(corpus.chunks()[0].metadata.source, "a.txt");
    assert_eq!(corpus.chunks()[0].content, "First document.");
    assert_eq!(corpus.chunks()[1].content, "Second document. It has two sentences.");
}

#[test]
fn unreadable_document_is_skipped() {
    let (_dir, config) = fixture();
    fs::write(config.textbooks_dir.join("broken.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let corpus = builder(&config, hashing()).build_from_dir(false).unwrap();
    assert!(!corpus.is_empty());
    assert!(corpus.chunks().iter().all(|c| c.metadata.source != "broken.txt"));
}

#[test]
fn encoder_failure_aborts_without_persisting() {
    let (_dir, config) = fixture();
    let err = builder(&config, Arc::new(FailingEncoder)).build_from_dir(false).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "got {err:?}");
    assert!(!CorpusStore::from_config(&config).exists());
    assert!(!config.index_dir.join("metadatas.jsonl").exists());
}

#[test]
fn short_batch_is_an_encoding_error() {
    let (_dir, config) = fixture();
    let err = builder(&config, Arc::new(ShortEncoder)).build_from_dir(false).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "got {err:?}");
    assert!(!CorpusStore::from_config(&config).exists());
}

#[test]
fn missing_textbooks_dir_is_not_found() {
    let (_dir, mut config) = fixture();
    config.textbooks_dir = config.textbooks_dir.join("nope");
    let err = builder(&config, hashing()).build_from_dir(false).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[test]
fn empty_textbooks_dir_builds_empty_corpus() {
    let (_dir, mut config) = fixture();
    config.textbooks_dir = config.textbooks_dir.join("empty");
    fs::create_dir_all(&config.textbooks_dir).unwrap();

    let corpus: Corpus<FlatL2Index> = builder(&config, hashing()).build_from_dir(false).unwrap();
    assert!(corpus.is_empty());
    assert_eq!(corpus.index().dim(), DIM);
    assert!(CorpusStore::from_config(&config).exists());
}

#[test]
fn index_from_another_encoder_is_rejected_at_load() {
    let (_dir, config) = fixture();
    builder(&config, hashing()).build_from_dir(false).unwrap();

    let narrower: Arc<dyn bookrag_core::traits::Encoder> = Arc::new(HashingEncoder::new(DIM / 2));
    let err = builder(&config, Arc::clone(&narrower)).build_from_dir(false).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");

    let rebuilt = builder(&config, narrower).build_from_dir(true).unwrap();
    assert_eq!(rebuilt.index().dim(), DIM / 2);
}
