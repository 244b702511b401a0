use crate::*;

use nodedb_core::node::ERROR_PUBLIC_KEY;

/// First sighting of a node keeps whatever key it presents.
#[test]
fn test_first_sighting_is_trusted() -> Result<()> {
    let registry = memory_registry();
    for num in [1, -5, i32::MAX, i32::MIN] {
        registry.upsert(keyed_sighting(num, "Node", "N", 1, 0x42))?;
        let stored = registry.node_by_num(num)?.context("node should exist")?.node;
        assert_eq!(stored.user.public_key.as_ref(), &[0x42u8; 32], "num {num}");
    }
    Ok(())
}

/// A pinned key survives a re-sighting with the same key and updates names.
#[test]
fn test_pinned_key_refresh() -> Result<()> {
    let registry = memory_registry();
    registry.upsert(keyed_sighting(9, "Old Name", "OLD", 1, 7))?;
    registry.upsert(keyed_sighting(9, "New Name", "NEW", 2, 7))?;

    let stored = registry.node_by_num(9)?.context("node should exist")?.node;
    assert_eq!(stored.user.public_key.as_ref(), &[7u8; 32]);
    assert_eq!(stored.user.long_name, "New Name");
    assert_eq!(stored.short_name.as_deref(), Some("NEW"));
    Ok(())
}

/// A different key for a pinned node is replaced by the sentinel, names
/// still update, and a later "correct" key does not clear the conflict.
#[test]
fn test_key_conflict_is_recorded_and_sticky() -> Result<()> {
    let registry = memory_registry();
    registry.upsert(keyed_sighting(9, "Honest", "HON", 1, 7))?;
    registry.upsert(keyed_sighting(9, "Spoofed", "SPF", 2, 8))?;

    let stored = registry.node_by_num(9)?.context("node should exist")?.node;
    assert_eq!(stored.user.public_key.as_ref(), &ERROR_PUBLIC_KEY);
    assert_eq!(stored.user.long_name, "Spoofed");
    assert_eq!(stored.long_name.as_deref(), Some("Spoofed"));

    registry.upsert(keyed_sighting(9, "Honest", "HON", 3, 7))?;
    let stored = registry.node_by_num(9)?.context("node should exist")?.node;
    assert!(stored.user.has_key_conflict());
    Ok(())
}

/// A batch over disjoint nodes ends in the same state as one-by-one upserts.
#[test]
fn test_batch_equals_sequential() -> Result<()> {
    let seeded = || -> Result<NodeRegistry> {
        let registry = memory_registry();
        registry.upsert(keyed_sighting(1, "A", "A", 1, 1))?;
        registry.upsert(sighting(2, "B", "B", 1))?;
        Ok(registry)
    };
    let batch = vec![
        keyed_sighting(1, "A2", "A2", 5, 2),
        keyed_sighting(2, "B2", "B2", 5, 3),
        keyed_sighting(3, "C", "C", 5, 4),
    ];

    let one_by_one = seeded()?;
    for node in batch.clone() {
        one_by_one.upsert(node)?;
    }
    let batched = seeded()?;
    batched.upsert_all(batch)?;

    let a = one_by_one.nodes_by_num()?;
    let b = batched.nodes_by_num()?;
    assert_eq!(a, b);
    assert!(b.iter().any(|n| n.node.num == 1 && n.node.user.has_key_conflict()));
    Ok(())
}

/// Concurrent writers presenting conflicting keys for one node cannot both
/// be accepted.
#[test]
fn test_concurrent_sightings_detect_conflict() -> Result<()> {
    let registry = memory_registry();
    registry.upsert(sighting(77, "Seed", "SD", 0))?;

    let workers: Vec<_> = (1u8..=8)
        .map(|key| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.upsert(keyed_sighting(77, "Racer", "RC", 1, key)))
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked")?;
    }

    let stored = registry.node_by_num(77)?.context("node should exist")?.node;
    assert!(stored.user.has_key_conflict());
    Ok(())
}
