use std::sync::Arc;

use doc_store::{DocStore, HashEmbedder, StoreConfig, StoreError};
use tempfile::TempDir;

const LOGIN: &str = "Login page lets registered users sign in with email address and password, shows an error banner after invalid credentials and locks after five failures. ";
const CART: &str = "Shopping cart keeps selected products, updates quantity totals instantly, applies discount coupons at checkout and calculates shipping cost by region. ";
const PROFILE: &str = "Profile settings allow changing avatar image, biography text, notification preferences, time zone and language; changes persist after saving the form. ";

fn para(seed: &str) -> String {
    seed.chars().cycle().take(150).collect()
}

fn three_paragraphs() -> String {
    [para(LOGIN), para(CART), para(PROFILE)].join("\n\n")
}

fn config(dir: &TempDir) -> StoreConfig {
    let mut cfg = StoreConfig::new_default(dir.path());
    cfg.chunk_size = 200;
    cfg.chunk_overlap = 20;
    cfg
}

async fn open(dir: &TempDir) -> DocStore {
    let cfg = config(dir);
    let embedder = Arc::new(HashEmbedder::new(cfg.embedding_dim));
    DocStore::open(cfg, embedder).await.unwrap()
}

#[tokio::test]
async fn three_paragraph_document_chunks_and_ranks() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let report = store
        .ingest_bytes("features.md", three_paragraphs().into_bytes())
        .await
        .unwrap();
    assert_eq!(report.document.chunk_count, 3);

    let chunks = store.chunks_of(&report.document.id).await;
    let bounds: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(bounds, vec![(0, 152), (132, 304), (284, 454)]);

    let hits = store
        .retrieve("applies discount coupons at checkout", Some(3), None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.index, 1);
    assert_eq!(hits[0].source, "features.md");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn empty_index_returns_no_context() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let hits = store.retrieve("anything at all", None, None).await.unwrap();
    assert!(hits.is_empty());
    assert!(!store.is_ingested().await);
}

#[tokio::test]
async fn reingesting_identical_content_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let first = store.ingest_bytes("guide.md", three_paragraphs().into_bytes()).await.unwrap();
    let chunks_before = store.chunks_of(&first.document.id).await;
    let second = store.ingest_bytes("guide.md", three_paragraphs().into_bytes()).await.unwrap();

    assert!(second.unchanged);
    assert_eq!(first.document.id, second.document.id);
    assert_eq!(store.chunks_of(&first.document.id).await, chunks_before);
    let stats = store.stats().await;
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.chunks, 3);
    assert_eq!(stats.vectors, 3);
}

#[tokio::test]
async fn new_content_under_same_name_replaces_document() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let v1 = store.ingest_text(&para(LOGIN), Some("notes.txt")).await.unwrap();
    let v2 = store.ingest_text(&para(CART), Some("notes.txt")).await.unwrap();
    assert_eq!(v2.replaced.as_deref(), Some(v1.document.id.as_str()));
    assert_eq!(store.documents().await.len(), 1);
    assert!(store.document(&v1.document.id).await.is_none());
}

#[tokio::test]
async fn delete_removes_document_and_vectors() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let a = store.ingest_text(&para(LOGIN), Some("login.md")).await.unwrap();
    store.ingest_text(&para(CART), Some("cart.md")).await.unwrap();

    let removed = store.delete_document(&a.document.id).await.unwrap();
    assert_eq!(removed.filename, "login.md");
    assert!(!dir.path().join("uploads/login.md").exists());

    let stats = store.stats().await;
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.vectors, stats.chunks);

    let hits = store.retrieve("email password login", Some(5), None).await.unwrap();
    assert!(hits.iter().all(|h| h.source == "cart.md"));

    assert!(matches!(
        store.delete_document(&a.document.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn scope_restricts_results_to_documents() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    store.ingest_text(&para(LOGIN), Some("login.md")).await.unwrap();
    let cart = store.ingest_text(&para(CART), Some("cart.md")).await.unwrap();

    let scope = vec![cart.document.id.clone()];
    let hits = store
        .retrieve("email address and password", Some(5), Some(&scope))
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.chunk.document_id == cart.document.id));
}

#[tokio::test]
async fn index_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = open(&dir).await;
        let r = store.ingest_bytes("features.md", three_paragraphs().into_bytes()).await.unwrap();
        r.document.id
    };
    assert!(dir.path().join("index/qa_agent.index").exists());
    assert!(dir.path().join("index/catalog.json").exists());

    let store = open(&dir).await;
    assert!(store.document(&id).await.is_some());
    let hits = store.retrieve("avatar biography", Some(1), None).await.unwrap();
    assert_eq!(hits[0].chunk.index, 2);
}

#[tokio::test]
async fn corrupt_index_is_rebuilt_from_uploads() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = open(&dir).await;
        store.ingest_bytes("features.md", three_paragraphs().into_bytes()).await.unwrap().document.id
    };
    std::fs::write(dir.path().join("index/qa_agent.index"), b"not an index").unwrap();

    let store = open(&dir).await;
    let stats = store.stats().await;
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.vectors, 3);
    assert!(store.document(&id).await.is_some());
}

#[tokio::test]
async fn rebuild_reproduces_the_same_index() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let r = store.ingest_bytes("features.md", three_paragraphs().into_bytes()).await.unwrap();
    let before = store.chunks_of(&r.document.id).await;

    let report = store.rebuild().await.unwrap();
    assert_eq!(report.documents, 1);
    assert_eq!(report.chunks, 3);
    assert_eq!(store.chunks_of(&r.document.id).await, before);
}

#[tokio::test]
async fn rejects_unsupported_and_oversized_files() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir);
    cfg.max_upload_bytes = 100;
    let store = DocStore::open(cfg, Arc::new(HashEmbedder::new(384))).await.unwrap();

    assert!(matches!(
        store.ingest_bytes("diagram.png", vec![0u8; 10]).await,
        Err(StoreError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        store.ingest_bytes("big.txt", vec![b'a'; 101]).await,
        Err(StoreError::FileTooLarge { size: 101, limit: 100 })
    ));
    assert_eq!(store.stats().await.documents, 0);
}

#[tokio::test]
async fn short_text_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    assert!(matches!(
        store.ingest_text("too short", None).await,
        Err(StoreError::InvalidInput(_))
    ));
    let r = store.ingest_text("long enough text here", None).await.unwrap();
    assert!(r.document.filename.starts_with("text-"));
    assert!(r.document.filename.ends_with(".txt"));
}

#[tokio::test]
async fn directory_ingestion_honours_recursion() {
    let dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("a.md"), para(LOGIN)).unwrap();
    std::fs::write(docs.path().join("b.txt"), para(CART)).unwrap();
    std::fs::write(docs.path().join("c.png"), [0u8; 4]).unwrap();
    std::fs::create_dir(docs.path().join("sub")).unwrap();
    std::fs::write(docs.path().join("sub/d.md"), para(PROFILE)).unwrap();

    let store = open(&dir).await;
    let flat = store.ingest_directory(docs.path(), false).await.unwrap();
    assert_eq!(flat.ingested.len(), 2);
    assert_eq!(flat.skipped, 1);
    assert!(flat.rejected.is_empty());

    let deep = store.ingest_directory(docs.path(), true).await.unwrap();
    assert_eq!(deep.ingested.iter().filter(|r| !r.unchanged).count(), 1);
    assert_eq!(store.stats().await.documents, 3);

    assert!(matches!(
        store.ingest_directory(docs.path().join("missing"), false).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn clear_empties_store_and_uploads() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    store.ingest_text(&para(LOGIN), Some("login.md")).await.unwrap();

    assert_eq!(store.clear().await.unwrap(), 1);
    assert_eq!(store.stats().await.vectors, 0);
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn write_paths_run_on_spawned_tasks() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open(&dir).await);

    let s = Arc::clone(&store);
    let bytes = tokio::spawn(async move { s.ingest_bytes("login.md", para(LOGIN).into_bytes()).await });
    assert!(bytes.await.unwrap().is_ok());

    let s = Arc::clone(&store);
    let text = tokio::spawn(async move { s.ingest_text(&para(CART), Some("cart.md")).await });
    assert!(text.await.unwrap().is_ok());

    let s = Arc::clone(&store);
    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("profile.md"), para(PROFILE)).unwrap();
    let root = docs.path().to_path_buf();
    let walk = tokio::spawn(async move { s.ingest_directory(root, false).await });
    assert!(walk.await.unwrap().is_ok());

    let s = Arc::clone(&store);
    let rebuilt = tokio::spawn(async move { s.rebuild().await });
    assert!(rebuilt.await.unwrap().is_ok());
    assert_eq!(store.stats().await.documents, 3);
}
