//! Rebalancing tests: how much of the key space each placement strategy
//! gives up when the pool grows or a member cycles.

use bytes::Bytes;
use stow_integration_tests::{test_data_seeded, TestCluster};
use stow_placement::{ConsistentRing, RingConfig};
use stow_router::RouterError;

/// Wide unbounded ring. No load bound, so ownership moves only where the
/// member set forces it.
fn wide_ring() -> RingConfig {
    RingConfig {
        partition_count: 271,
        replication_factor: 20,
        load_factor: None,
    }
}

async fn populate(cluster: &TestCluster, count: usize) {
    for i in 0..count {
        let data = test_data_seeded(64, i as u32);
        cluster
            .put(&format!("object_{i:03}"), Bytes::from(data))
            .await
            .unwrap();
    }
}

/// Keys still readable after a membership change, by index. Readable
/// objects must come back byte-identical; anything else is `NotFound`.
async fn surviving_keys(cluster: &TestCluster, count: usize) -> Vec<usize> {
    let mut survivors = Vec::new();
    for i in 0..count {
        let expected = test_data_seeded(64, i as u32);
        match cluster.get(&format!("object_{i:03}")).await {
            Ok(data) => {
                assert_eq!(data, Bytes::from(expected), "corrupted object_{i:03}");
                survivors.push(i);
            }
            Err(RouterError::NotFound { .. }) => {}
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
    survivors
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_modulo_growth_remaps_bounded_fraction() {
    let mut cluster = TestCluster::new(2).await;
    populate(&cluster, 200).await;

    cluster.add_node().await;
    assert_eq!(cluster.registered(), 3);

    let kept = surviving_keys(&cluster, 200).await.len();
    let moved = 200 - kept;
    let fraction = moved as f64 / 200.0;
    assert!(
        (0.5..0.8).contains(&fraction),
        "modulo 2->3 should remap roughly two thirds of keys, moved {moved} of 200"
    );
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_modulo_growth_heals_on_rewrite() {
    let mut cluster = TestCluster::new(2).await;
    populate(&cluster, 200).await;

    cluster.add_node().await;
    let survivors = surviving_keys(&cluster, 200).await;

    // Rewrite what went dark. Stale copies stay behind on the old
    // owners; the router just never routes to them again.
    for i in 0..200usize {
        if !survivors.contains(&i) {
            let data = test_data_seeded(64, i as u32);
            cluster
                .put(&format!("object_{i:03}"), Bytes::from(data))
                .await
                .unwrap();
        }
    }

    assert_eq!(surviving_keys(&cluster, 200).await.len(), 200);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_ring_growth_steals_only_from_survivors() {
    let mut cluster =
        TestCluster::with_strategy(2, Box::new(ConsistentRing::new(wide_ring()))).await;
    populate(&cluster, 300).await;

    let before = [cluster.object_count(1), cluster.object_count(2)];
    assert_eq!(before.iter().sum::<usize>(), 300);

    cluster.add_node().await;
    let survivors = surviving_keys(&cluster, 300).await;
    let lost: Vec<usize> = (0..300).filter(|i| !survivors.contains(i)).collect();
    assert!(!lost.is_empty(), "the newcomer must take over some keys");

    // Every key the newcomer took over now routes to it; no key moved
    // between the two survivors.
    for &i in &lost {
        let data = test_data_seeded(64, i as u32);
        cluster
            .put(&format!("object_{i:03}"), Bytes::from(data))
            .await
            .unwrap();
    }
    assert_eq!(cluster.object_count(1), before[0]);
    assert_eq!(cluster.object_count(2), before[1]);
    assert_eq!(cluster.object_count(3), lost.len());
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_ring_member_cycle_keeps_table() {
    let cluster =
        TestCluster::with_strategy(5, Box::new(ConsistentRing::new(wide_ring()))).await;
    populate(&cluster, 300).await;

    let before: Vec<usize> = (1..=5).map(|node| cluster.object_count(node)).collect();

    cluster.kill_node(5).await;
    cluster.revive_node(5).await;

    let after: Vec<usize> = (1..=5).map(|node| cluster.object_count(node)).collect();
    assert_eq!(after, before, "a leave/rejoin cycle must rebuild the same table");
    assert_eq!(surviving_keys(&cluster, 300).await.len(), 300);
}
