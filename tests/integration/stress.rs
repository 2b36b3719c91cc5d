//! Stress tests: parallel writers, readers racing writers, and reads
//! while a backend flaps in and out of the pool.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Barrier;

use stow_integration_tests::{test_data_seeded, TestCluster};
use stow_placement::{ConsistentRing, RingConfig};
use stow_router::RouterError;

const WRITERS: usize = 10;
const OBJECTS_PER_WRITER: usize = 100;

fn wide_ring() -> RingConfig {
    RingConfig {
        partition_count: 271,
        replication_factor: 20,
        load_factor: None,
    }
}

fn payload(writer: usize, object: usize) -> Vec<u8> {
    test_data_seeded(256, (writer * 1000 + object) as u32)
}

#[tokio::test]
async fn test_concurrent_writers() {
    let cluster = Arc::new(TestCluster::new(5).await);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let mut tasks = Vec::new();
    for writer in 0..WRITERS {
        let cluster = cluster.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            for object in 0..OBJECTS_PER_WRITER {
                let key = format!("w{writer}_{object:03}");
                cluster
                    .put(&key, Bytes::from(payload(writer, object)))
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for writer in 0..WRITERS {
        for object in 0..OBJECTS_PER_WRITER {
            let key = format!("w{writer}_{object:03}");
            let got = cluster.get(&key).await.unwrap();
            assert_eq!(got, Bytes::from(payload(writer, object)), "corrupted {key}");
        }
    }

    let counts: Vec<usize> = (1..=5).map(|node| cluster.object_count(node)).collect();
    assert_eq!(counts.iter().sum::<usize>(), WRITERS * OBJECTS_PER_WRITER);
    for (node, count) in counts.iter().enumerate() {
        assert!(
            *count >= 100,
            "backend {} holds only {count} of 1000 objects",
            node + 1
        );
    }
}

#[tokio::test]
async fn test_readers_race_writers() {
    let cluster = Arc::new(TestCluster::new(5).await);

    for i in 0..200usize {
        let data = test_data_seeded(128, i as u32);
        cluster
            .put(&format!("base_{i:03}"), Bytes::from(data))
            .await
            .unwrap();
    }

    let barrier = Arc::new(Barrier::new(8));
    let mut tasks = Vec::new();

    for _ in 0..4 {
        let cluster = cluster.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..3 {
                for i in 0..200usize {
                    let expected = test_data_seeded(128, i as u32);
                    let got = cluster.get(&format!("base_{i:03}")).await.unwrap();
                    assert_eq!(got, Bytes::from(expected), "corrupted base_{i:03}");
                }
            }
        }));
    }

    for writer in 0..4usize {
        let cluster = cluster.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            for object in 0..50usize {
                let key = format!("fresh{writer}_{object:03}");
                cluster
                    .put(&key, Bytes::from(payload(writer, object)))
                    .await
                    .unwrap();
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    for writer in 0..4usize {
        for object in 0..50usize {
            let key = format!("fresh{writer}_{object:03}");
            let got = cluster.get(&key).await.unwrap();
            assert_eq!(got, Bytes::from(payload(writer, object)), "corrupted {key}");
        }
    }
}

#[tokio::test]
async fn test_reads_during_member_churn() {
    let cluster = Arc::new(
        TestCluster::with_strategy(5, Box::new(ConsistentRing::new(wide_ring()))).await,
    );

    for i in 0..300usize {
        let data = test_data_seeded(64, i as u32);
        cluster
            .put(&format!("object_{i:03}"), Bytes::from(data))
            .await
            .unwrap();
    }

    let flapper = {
        let cluster = cluster.clone();
        tokio::spawn(async move {
            for _ in 0..6 {
                cluster.kill_node(5).await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                cluster.revive_node(5).await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let cluster = cluster.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..3 {
                for i in 0..300usize {
                    let expected = test_data_seeded(64, i as u32);
                    match cluster.get(&format!("object_{i:03}")).await {
                        Ok(data) => {
                            assert_eq!(data, Bytes::from(expected), "corrupted object_{i:03}")
                        }
                        // Keys owned by the flapping backend go dark while
                        // it is out; they must never come back wrong.
                        Err(RouterError::NotFound { .. }) => {}
                        Err(err) => panic!("unexpected error: {err:?}"),
                    }
                }
            }
        }));
    }

    flapper.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    // The flapper ends with the backend revived, so nothing stays dark.
    for i in 0..300usize {
        let expected = test_data_seeded(64, i as u32);
        let got = cluster.get(&format!("object_{i:03}")).await.unwrap();
        assert_eq!(got, Bytes::from(expected), "object_{i:03} still dark");
    }
}
