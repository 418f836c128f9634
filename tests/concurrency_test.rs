//! Concurrency tests for file storage.
//!
//! Same-name operations are serialised, so racing writers and deleters
//! must leave a consistent directory behind.

use std::sync::Arc;

use filebox::FileStorage;
use tempfile::TempDir;

fn setup_storage() -> (TempDir, Arc<FileStorage>) {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(
        temp_dir.path().join("uploads"),
        temp_dir.path().join("thumbnails"),
    )
    .unwrap();
    (temp_dir, Arc::new(storage))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_same_name() {
    let (_dir, storage) = setup_storage();

    let contents: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; 4096]).collect();
    let mut handles = Vec::new();
    for content in contents.clone() {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.save("shared.bin", &content, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let files = storage.list().await.unwrap();
    assert_eq!(files.len(), 1);

    let stored = tokio::fs::read(storage.file_path("shared.bin").unwrap())
        .await
        .unwrap();
    // Whole content of exactly one writer
    assert!(contents.contains(&stored));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_succeed_once() {
    let (_dir, storage) = setup_storage();
    storage
        .save("target.txt", b"delete me", Some(&b"thumb"[..]))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move { storage.delete("target.txt").await }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert!(storage.list().await.unwrap().is_empty());
    assert!(!storage.thumbnail_exists("target.txt").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renames_onto_same_target() {
    let (_dir, storage) = setup_storage();
    for i in 0..6 {
        storage
            .save(&format!("src{i}.txt"), format!("{i}").as_bytes(), None)
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..6 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.rename(&format!("src{i}.txt"), "target.txt").await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    // One rename wins; the rest see a conflict and keep their source
    assert_eq!(successes, 1);
    let names: Vec<String> = storage
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names.len(), 6);
    assert!(names.contains(&"target.txt".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_renames_do_not_deadlock() {
    let (_dir, storage) = setup_storage();
    storage.save("a.txt", b"a", None).await.unwrap();
    storage.save("b.txt", b"b", None).await.unwrap();

    let s1 = storage.clone();
    let s2 = storage.clone();
    let first = tokio::spawn(async move { s1.rename("a.txt", "b.txt").await });
    let second = tokio::spawn(async move { s2.rename("b.txt", "a.txt").await });

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        (first.await.unwrap(), second.await.unwrap())
    })
    .await
    .expect("renames deadlocked");

    // Both targets exist, so both renames conflict
    assert!(result.0.is_err());
    assert!(result.1.is_err());
    assert_eq!(storage.list().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_while_files_are_deleted() {
    let (_dir, storage) = setup_storage();

    let churn = {
        let storage = storage.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                for i in 0..20 {
                    storage
                        .save(&format!("f{i}.txt"), b"churn", None)
                        .await
                        .unwrap();
                }
                for i in 0..20 {
                    storage.delete(&format!("f{i}.txt")).await.unwrap();
                }
            }
        })
    };

    loop {
        let files = storage.list().await.unwrap();
        assert!(files.iter().all(|f| f.name.starts_with('f')));
        if churn.is_finished() {
            break;
        }
    }
    churn.await.unwrap();

    assert!(storage.list().await.unwrap().is_empty());
}
