//! Behaviour every repository backend has to share.
#![allow(dead_code)]

use golink_storage::{ClickStats, ErrorKind, Link, LinkRepository, StatsRepository, StorageError};
use jiff::Timestamp;
use std::sync::Arc;

pub fn ts(seconds: i64) -> Timestamp {
    Timestamp::from_second(seconds).unwrap()
}

pub fn link(short: &str, long: &str) -> Link {
    Link {
        short: short.to_string(),
        long: long.to_string(),
        created: ts(1000),
        last_edit: ts(1000),
        owner: "a@b.com".to_string(),
    }
}

pub fn stats(pairs: &[(&str, i64)]) -> ClickStats {
    pairs
        .iter()
        .map(|(short, clicks)| (short.to_string(), *clicks))
        .collect()
}

pub async fn round_trip_ignores_case_and_hyphens<S: LinkRepository>(store: &S) {
    let foo = link("Foo-Bar", "https://example.com");
    store.save(&foo).await.unwrap();

    assert_eq!(store.load("Foo-Bar").await.unwrap(), foo);
    assert_eq!(store.load("foobar").await.unwrap(), foo);
    assert_eq!(store.load("FOO-BAR").await.unwrap(), foo);
}

pub async fn load_missing_is_not_found<S: LinkRepository>(store: &S) {
    let err = store.load("Missing-Link").await.unwrap_err();
    assert_eq!(err, StorageError::NotFound("missinglink".to_string()));
}

pub async fn load_all_on_empty_store<S: LinkRepository>(store: &S) {
    assert!(store.load_all().await.unwrap().is_empty());
}

pub async fn load_all_returns_every_link<S: LinkRepository>(store: &S) {
    let mut expected = vec![
        link("alpha", "https://a.example"),
        link("Beta", "https://b.example"),
        link("gamma-ray", "https://{{.Path}}.example"),
    ];
    for l in &expected {
        store.save(l).await.unwrap();
    }

    let mut got = store.load_all().await.unwrap();
    got.sort_by(|a, b| a.short.cmp(&b.short));
    expected.sort_by(|a, b| a.short.cmp(&b.short));
    assert_eq!(got, expected);
}

pub async fn save_twice_keeps_one_link<S: LinkRepository>(store: &S) {
    let l = link("twice", "https://example.com");
    store.save(&l).await.unwrap();
    store.save(&l).await.unwrap();

    assert_eq!(store.load_all().await.unwrap(), vec![l]);
}

pub async fn save_replaces_every_field<S: LinkRepository>(store: &S) {
    store
        .save(&link("go-link", "https://one.example"))
        .await
        .unwrap();

    let replacement = Link {
        short: "GoLink".to_string(),
        long: "https://two.example".to_string(),
        created: ts(2000),
        last_edit: ts(3000),
        owner: String::new(),
    };
    store.save(&replacement).await.unwrap();

    assert_eq!(store.load("golink").await.unwrap(), replacement);
    assert_eq!(store.load_all().await.unwrap().len(), 1);
}

pub async fn delete_contract<S: LinkRepository>(store: &S) {
    assert!(store.delete("nothing-here").await.unwrap_err().is_not_found());

    store
        .save(&link("Doomed", "https://example.com"))
        .await
        .unwrap();
    store
        .save(&link("survivor", "https://example.com"))
        .await
        .unwrap();

    store.delete("DOOMED").await.unwrap();
    assert!(store.load("doomed").await.unwrap_err().is_not_found());
    assert!(store.delete("doomed").await.unwrap_err().is_not_found());
    assert!(store.load("survivor").await.is_ok());
}

pub async fn stats_are_additive<S: StatsRepository>(store: &S) {
    store.save_stats(&stats(&[("k", 3)])).await.unwrap();
    store.save_stats(&stats(&[("k", 5)])).await.unwrap();

    assert_eq!(store.load_stats().await.unwrap()["k"], 8);
}

pub async fn stats_are_keyed_canonically<S: StatsRepository>(store: &S) {
    store
        .save_stats(&stats(&[("Go-Link", 2), ("other", 1)]))
        .await
        .unwrap();
    store.save_stats(&stats(&[("golink", 4)])).await.unwrap();

    let totals = store.load_stats().await.unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals["golink"], 6);
    assert_eq!(totals["other"], 1);
}

pub async fn empty_stats_batch_is_a_no_op<S: StatsRepository>(store: &S) {
    store.save_stats(&ClickStats::new()).await.unwrap();
    assert!(store.load_stats().await.unwrap().is_empty());
}

pub async fn delete_stats_is_isolated<S: StatsRepository>(store: &S) {
    store
        .save_stats(&stats(&[("k", 3), ("j", 2)]))
        .await
        .unwrap();
    store.save_stats(&stats(&[("k", 1)])).await.unwrap();

    store.delete_stats("K").await.unwrap();
    // nothing recorded is fine too
    store.delete_stats("never-clicked").await.unwrap();

    let totals = store.load_stats().await.unwrap();
    assert!(!totals.contains_key("k"));
    assert_eq!(totals["j"], 2);
}

pub async fn overflowing_click_total_is_a_storage_fault<S: StatsRepository>(store: &S) {
    store.save_stats(&stats(&[("k", i64::MAX)])).await.unwrap();
    store.save_stats(&stats(&[("k", 1)])).await.unwrap();

    let err = store.load_stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage, "{err:?}");
}

pub async fn concurrent_saves_to_distinct_keys<S: LinkRepository>(store: Arc<S>) {
    let mut handles = vec![];

    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let l = link(&format!("code-{i:03}"), &format!("https://example{i}.com"));
            store.save(&l).await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..16 {
        let got = store.load(&format!("code{i:03}")).await.unwrap();
        assert_eq!(got.long, format!("https://example{i}.com"));
    }
    assert_eq!(store.load_all().await.unwrap().len(), 16);
}

pub async fn concurrent_loads_never_see_torn_writes<S: LinkRepository>(store: Arc<S>) {
    let first = link("Flip-Flop", "https://one.example");
    let second = Link {
        short: "flipflop".to_string(),
        long: "https://two.example".to_string(),
        created: ts(2000),
        last_edit: ts(2500),
        owner: "c@d.com".to_string(),
    };
    store.save(&first).await.unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let (first, second) = (first.clone(), second.clone());
        tokio::spawn(async move {
            for round in 0..50 {
                let next = if round % 2 == 0 { &second } else { &first };
                store.save(next).await.unwrap();
            }
        })
    };

    let mut readers = vec![];
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let (first, second) = (first.clone(), second.clone());
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let seen = store.load("FLIP-FLOP").await.unwrap();
                assert!(seen == first || seen == second, "torn read: {seen:?}");
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}
