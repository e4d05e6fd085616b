use std::fs;
use std::sync::Arc;

use codechat_indexer::{EmbeddingClient, FsEvent, Indexer, MockEmbeddingClient};
use tempfile::tempdir;

fn new_indexer(root: &std::path::Path, dimension: usize) -> (Indexer, Arc<MockEmbeddingClient>) {
    let client = Arc::new(MockEmbeddingClient::new(dimension));
    let embedding_client: Arc<dyn EmbeddingClient> = client.clone();
    let cache_dir = root.join(".cache/codechat");
    let indexer = Indexer::new(root, cache_dir, dimension, embedding_client).expect("indexer");
    (indexer, client)
}

#[tokio::test]
async fn simple_python_chain() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("a.py"), "import b").expect("write a.py");
    fs::write(root.join("b.py"), "import c").expect("write b.py");
    fs::write(root.join("c.py"), "").expect("write c.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");

    assert_eq!(
        indexer.direct_deps("a.py").await,
        ["b.py".to_string()].into_iter().collect()
    );
    assert_eq!(
        indexer.all_deps("a.py").await,
        ["b.py".to_string(), "c.py".to_string()].into_iter().collect()
    );
    assert_eq!(
        indexer.all_dependents("c.py").await,
        ["a.py".to_string(), "b.py".to_string()].into_iter().collect()
    );
}

#[tokio::test]
async fn import_cycle_terminates() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("a.py"), "import b").expect("write a.py");
    fs::write(root.join("b.py"), "import a").expect("write b.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");

    assert_eq!(
        indexer.all_deps("a.py").await,
        ["b.py".to_string()].into_iter().collect()
    );
    assert_eq!(
        indexer.all_deps("b.py").await,
        ["a.py".to_string()].into_iter().collect()
    );
}

#[tokio::test]
async fn colliding_basenames_resolve_conservatively_inclusive() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("pkg1")).expect("mkdir pkg1");
    fs::create_dir_all(root.join("pkg2")).expect("mkdir pkg2");
    fs::write(root.join("pkg1/utils.py"), "").expect("write pkg1/utils.py");
    fs::write(root.join("pkg2/utils.py"), "").expect("write pkg2/utils.py");
    fs::write(root.join("main.py"), "import pkg1.utils").expect("write main.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");

    let deps = indexer.direct_deps("main.py").await;
    assert!(deps.contains("pkg1/utils.py"));
    assert!(deps.contains("pkg2/utils.py"));
}

#[tokio::test]
async fn bare_single_word_import_matches_root_only() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("subdir")).expect("mkdir subdir");
    fs::write(root.join("helpers.py"), "").expect("write root helpers.py");
    fs::write(root.join("subdir/helpers.py"), "").expect("write subdir helpers.py");
    fs::write(root.join("main.py"), "import helpers").expect("write main.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");

    assert_eq!(
        indexer.direct_deps("main.py").await,
        ["helpers.py".to_string()].into_iter().collect()
    );
}

#[tokio::test]
async fn cached_re_embed_only_rebuilds_changed_file() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let a_path = root.join("a.py");
    fs::write(&a_path, "x".repeat(9000)).expect("write a.py");
    fs::write(root.join("b.py"), "unrelated content").expect("write b.py");

    let (indexer, client) = new_indexer(root, 8);
    indexer.build_index().await.expect("first build");
    let calls_after_first_build = client.call_count();
    assert_eq!(calls_after_first_build, 2);

    // Modify a.py's trailing bytes, past the 8000-character embedding window.
    let mut content = "x".repeat(9000);
    content.push_str("CHANGED");
    fs::write(&a_path, content).expect("rewrite a.py");

    indexer.build_index().await.expect("second build");
    // Only a.py's contentHash changed, so only a.py should be re-embedded.
    assert_eq!(client.call_count(), calls_after_first_build + 1);
}

#[tokio::test]
async fn move_event_relocates_store_and_graph_entries() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let src = root.join("a.py");
    let dst = root.join("renamed.py");
    fs::write(&src, "import b").expect("write a.py");
    fs::write(root.join("b.py"), "").expect("write b.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");
    assert_eq!(
        indexer.direct_deps("a.py").await,
        ["b.py".to_string()].into_iter().collect()
    );

    fs::rename(&src, &dst).expect("rename on disk");
    indexer
        .process_event(FsEvent::moved(&src, &dst))
        .await
        .expect("process moved event");

    assert!(indexer.direct_deps("a.py").await.is_empty());
    assert!(indexer.direct_dependents("a.py").await.is_empty());
    assert_eq!(
        indexer.direct_deps("renamed.py").await,
        ["b.py".to_string()].into_iter().collect()
    );
}

#[tokio::test]
async fn empty_project_yields_empty_store_and_graph() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    let (indexer, client) = new_indexer(root, 8);
    indexer.build_index().await.expect("build_index");
    assert_eq!(client.call_count(), 0);

    // query still embeds the query text itself even though the store it
    // searches is empty (§4.6: query always calls the EmbeddingClient).
    assert!(indexer.query("anything", 5).await.expect("query").is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn repeated_modified_event_with_unchanged_bytes_is_a_no_op() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let path = root.join("a.py");
    fs::write(&path, "import b").expect("write a.py");
    fs::write(root.join("b.py"), "").expect("write b.py");

    let (indexer, client) = new_indexer(root, 8);
    indexer
        .process_event(FsEvent::modified(&path))
        .await
        .expect("first modified event");
    let calls_after_first = client.call_count();

    indexer
        .process_event(FsEvent::modified(&path))
        .await
        .expect("second modified event");
    assert_eq!(client.call_count(), calls_after_first);
}

#[tokio::test]
async fn created_then_deleted_restores_pre_created_state() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let path = root.join("new_file.py");
    fs::write(&path, "content").expect("write new_file.py");

    let (indexer, _client) = new_indexer(root, 8);
    indexer
        .process_event(FsEvent::created(&path))
        .await
        .expect("created event");
    assert!(indexer.query("content", 5).await.expect("query").iter().any(|(id, _)| id == "new_file.py"));

    fs::remove_file(&path).expect("remove file");
    indexer
        .process_event(FsEvent::deleted(&path))
        .await
        .expect("deleted event");
    assert!(!indexer
        .query("content", 5)
        .await
        .expect("query")
        .iter()
        .any(|(id, _)| id == "new_file.py"));
}
