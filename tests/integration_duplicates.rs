//! Integration tests for the exact-duplicate pipeline.
//!
//! These tests verify end-to-end behavior including:
//! - Name-and-size grouping across roots
//! - Hidden directories and files
//! - File caps
//! - Cancellation

use assert_fs::prelude::*;
use dupfree::core::duplicates::DuplicatePolicy;
use dupfree::core::pipeline::{CancellationToken, DuplicateSearch, PartialResults};
use dupfree::events::{Event, EventChannel, PipelineEvent};
use predicates::prelude::*;

fn search(roots: Vec<std::path::PathBuf>) -> DuplicateSearch {
    DuplicateSearch::builder().roots(roots).build().unwrap()
}

#[test]
fn empty_directory_has_no_groups() {
    let temp = assert_fs::TempDir::new().unwrap();

    let report = search(vec![temp.path().to_path_buf()]).run(&CancellationToken::new());

    assert_eq!(report.files_scanned, 0);
    assert!(report.groups.is_empty());
    assert!(!report.cancelled);
}

#[test]
fn same_name_and_size_across_roots_are_grouped() {
    let left = assert_fs::TempDir::new().unwrap();
    let right = assert_fs::TempDir::new().unwrap();
    left.child("holiday/a.jpg").write_binary(b"0123456789").unwrap();
    right.child("backup/a.jpg").write_binary(b"9876543210").unwrap();
    right.child("backup/b.jpg").write_binary(b"0123456789").unwrap();

    let report = search(vec![left.path().to_path_buf(), right.path().to_path_buf()])
        .run(&CancellationToken::new());

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.key, "a.jpg_10");
    assert_eq!(group.files.len(), 2);
    assert!(group.files.iter().all(|f| f.size == 10 && f.name == "a.jpg"));
    assert!(predicate::path::exists().eval(&group.files[0].path));
    assert!(group.files[0].path.is_absolute());
}

#[test]
fn every_group_shares_name_and_size() {
    let temp = assert_fs::TempDir::new().unwrap();
    for dir in ["x", "y", "z"] {
        temp.child(format!("{}/one.txt", dir)).write_str("1").unwrap();
        temp.child(format!("{}/two.txt", dir)).write_str("22").unwrap();
    }
    temp.child("z/two.txt").write_str("333").unwrap();

    let report = search(vec![temp.path().to_path_buf()]).run(&CancellationToken::new());

    assert_eq!(report.groups.len(), 2);
    for group in &report.groups {
        assert!(group.files.len() >= 2);
        let first = &group.files[0];
        assert!(group.files.iter().all(|f| f.same_name_and_size(first)));
    }
}

#[test]
fn hidden_directories_are_not_entered() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("visible/a.txt").write_str("same").unwrap();
    temp.child(".hidden/a.txt").write_str("same").unwrap();

    let report = search(vec![temp.path().to_path_buf()]).run(&CancellationToken::new());

    assert_eq!(report.files_scanned, 1);
    assert!(report.groups.is_empty());
}

#[test]
fn missing_root_does_not_stop_other_roots() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a/f.bin").write_binary(&[1, 2, 3]).unwrap();
    temp.child("b/f.bin").write_binary(&[1, 2, 3]).unwrap();

    let report = search(vec![
        temp.path().join("does-not-exist"),
        temp.path().to_path_buf(),
    ])
    .run(&CancellationToken::new());

    assert_eq!(report.root_errors.len(), 1);
    assert_eq!(report.groups.len(), 1);
}

#[test]
fn file_cap_keeps_group_prefixes() {
    let temp = assert_fs::TempDir::new().unwrap();
    for dir in ["1", "2", "3"] {
        temp.child(format!("{}/a.dat", dir)).write_str("aa").unwrap();
    }
    for dir in ["1", "2"] {
        temp.child(format!("{}/b.dat", dir)).write_str("bbb").unwrap();
    }

    let report = DuplicateSearch::builder()
        .roots(vec![temp.path().to_path_buf()])
        .max_files(Some(4))
        .build()
        .unwrap()
        .run(&CancellationToken::new());

    let total: usize = report.groups.iter().map(|g| g.files.len()).sum();
    assert!(total <= 4);
    assert!(report.groups.iter().all(|g| g.files.len() >= 2));
}

#[test]
fn content_verification_splits_lookalikes() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("1/scan.pdf").write_str("AAAA").unwrap();
    temp.child("2/scan.pdf").write_str("AAAA").unwrap();
    temp.child("3/scan.pdf").write_str("BBBB").unwrap();

    let report = DuplicateSearch::builder()
        .roots(vec![temp.path().to_path_buf()])
        .policy(DuplicatePolicy::ContentVerified)
        .build()
        .unwrap()
        .run(&CancellationToken::new());

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].files.len(), 2);
    assert!(report.groups[0]
        .files
        .iter()
        .all(|f| !f.path.starts_with(temp.path().join("3"))));
}

#[test]
fn cancelled_walk_returns_no_groups() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("1/a.txt").write_str("x").unwrap();
    temp.child("2/a.txt").write_str("x").unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    for partial in [PartialResults::Discard, PartialResults::Keep] {
        let report = DuplicateSearch::builder()
            .roots(vec![temp.path().to_path_buf()])
            .partial_results(partial)
            .build()
            .unwrap()
            .run(&cancel);

        assert!(report.cancelled);
        assert!(report.groups.is_empty());
    }
}

#[test]
fn cancelling_during_a_spawned_run_discards_output() {
    let roots: Vec<_> = (0..4).map(|_| assert_fs::TempDir::new().unwrap()).collect();
    for root in &roots {
        for n in 0..20 {
            root.child(format!("d{}/f{}.txt", n, n)).write_str("dup").unwrap();
        }
    }

    let (sender, receiver) = EventChannel::new();
    let handle = search(roots.iter().map(|r| r.path().to_path_buf()).collect()).spawn(sender);

    let mut cancelled = false;
    for event in receiver.iter() {
        if matches!(event, Event::Status(_)) && !cancelled {
            handle.cancel();
            cancelled = true;
        }
        if matches!(event, Event::Pipeline(PipelineEvent::Cancelled)) {
            break;
        }
    }

    let report = handle.join().unwrap();
    if report.cancelled {
        assert!(report.groups.is_empty());
    } else {
        // The run finished before the cancel landed
        assert_eq!(report.groups.len(), 20);
    }
}

#[test]
fn keep_returns_groups_from_roots_walked_before_the_cancel() {
    let roots: Vec<_> = (0..6).map(|_| assert_fs::TempDir::new().unwrap()).collect();
    for (n, root) in roots.iter().enumerate() {
        root.child(format!("dup/a{}.txt", n)).write_str("abc").unwrap();
        root.child(format!("copy/a{}.txt", n)).write_str("abc").unwrap();
    }

    let (sender, receiver) = EventChannel::new();
    let handle = DuplicateSearch::builder()
        .roots(roots.iter().map(|r| r.path().to_path_buf()).collect())
        .partial_results(PartialResults::Keep)
        .build()
        .unwrap()
        .spawn(sender);

    // The walker reports once per finished root
    for event in receiver.iter() {
        if matches!(event, Event::Status(_)) {
            handle.cancel();
        }
    }

    let report = handle.join().unwrap();
    assert!(!report.groups.is_empty());

    // Groups come from a prefix of the roots, at least the first one
    let keys: Vec<_> = report.groups.iter().map(|g| g.key.clone()).collect();
    let expected: Vec<_> = (0..keys.len()).map(|n| format!("a{}.txt_3", n)).collect();
    assert_eq!(keys, expected);
    if !report.cancelled {
        assert_eq!(keys.len(), roots.len());
    }
}
