use crate::*;

use nodedb_core::node::MyNodeInfo;
use nodedb_core::query::NodeQuery;

fn placed(num: i32, long: &str, last_heard: i64, lat: f64, lon: f64, hops: i32) -> NodeRecord {
    let mut node = sighting(num, long, &long[..1], last_heard);
    node.latitude = Some(lat);
    node.longitude = Some(lon);
    node.hops_away = hops;
    node
}

/// A small mesh around a self-node at (10, 10).
fn mesh() -> Result<NodeRegistry> {
    let registry = memory_registry();
    registry.upsert_all(vec![
        placed(1, "Self", 5, 10.0, 10.0, 0),
        placed(2, "bravo", 300, 10.5, 10.0, 1),
        placed(3, "Alpha", 100, 12.0, 10.0, 3),
        placed(4, "charlie", 200, 10.1, 10.0, -1),
        sighting(5, "Delta", "D", 400),
    ])?;
    let mut unknown = NodeRecord::new(6);
    unknown.last_heard = 500;
    registry.upsert(unknown)?;
    registry.set_my_node_info(MyNodeInfo::new(1))?;
    Ok(registry)
}

/// Self comes first under every sort, recognized or not.
#[test]
fn test_self_first_under_every_sort() -> Result<()> {
    let registry = mesh()?;
    for sort in [
        "last_heard",
        "alpha",
        "distance",
        "hops_away",
        "channel",
        "via_mqtt",
        "via_favorite",
        "bogus",
    ] {
        let out = registry.list(&NodeQuery::sorted_by(sort))?;
        assert_eq!(out[0].num, 1, "sort {sort}");
        assert_eq!(out.len(), 6, "sort {sort}");
    }
    Ok(())
}

#[test]
fn test_distance_sort() -> Result<()> {
    let registry = mesh()?;
    let out = registry.list(&NodeQuery::sorted_by("distance"))?;
    // 6 has no names and no fix, 5 has names and no fix: both trail, newest first.
    assert_eq!(nums(&out), vec![1, 4, 2, 3, 6, 5]);
    Ok(())
}

#[test]
fn test_alpha_sort_ignores_case() -> Result<()> {
    let registry = mesh()?;
    let out = registry.list(&NodeQuery::sorted_by("alpha"))?;
    // Node 6 has no long name and sorts ahead of named nodes.
    assert_eq!(nums(&out), vec![1, 6, 3, 2, 4, 5]);
    Ok(())
}

#[test]
fn test_hops_sort_puts_unknown_last() -> Result<()> {
    let registry = mesh()?;
    let out = registry.list(&NodeQuery::sorted_by("hops_away"))?;
    assert_eq!(nums(&out), vec![1, 2, 3, 6, 5, 4]);
    Ok(())
}

#[test]
fn test_filters_combine() -> Result<()> {
    let registry = mesh()?;

    let out = registry.list(&NodeQuery::default().include_unknown(false))?;
    assert!(!nums(&out).contains(&6));

    let out = registry.list(&NodeQuery::default().hops_away_max(1))?;
    // Self is exempt from the hop cap; unknown hop counts never pass it.
    assert_eq!(nums(&out), vec![1, 2]);

    let out = registry.list(&NodeQuery::default().last_heard_min(250))?;
    assert_eq!(nums(&out), vec![6, 5, 2]);

    let out = registry.list(&NodeQuery::sorted_by("alpha").with_filter("HAR"))?;
    assert_eq!(nums(&out), vec![4]);
    Ok(())
}

#[test]
fn test_filter_matches_node_id() -> Result<()> {
    let registry = memory_registry();
    registry.upsert(sighting(-1, "Edge", "E", 1))?;
    registry.upsert(sighting(0x2a, "Answer", "A", 1))?;

    let out = registry.list(&NodeQuery::default().with_filter("!ffff"))?;
    assert_eq!(nums(&out), vec![-1]);

    let out = registry.list(&NodeQuery::default().with_filter("4294967295"))?;
    assert_eq!(nums(&out), vec![-1]);

    let out = registry.list(&NodeQuery::default().with_filter("2a"))?;
    assert_eq!(nums(&out), vec![0x2a]);
    Ok(())
}

/// Deleting the self-node leaves MyNodeInfo alone and the listing still works.
#[test]
fn test_self_node_may_be_absent() -> Result<()> {
    let registry = mesh()?;
    registry.delete_node(1)?;
    assert!(registry.my_node_info()?.is_some());

    let out = registry.list(&NodeQuery::sorted_by("distance"))?;
    assert_eq!(out.len(), 5);
    assert!(!nums(&out).contains(&1));
    Ok(())
}
