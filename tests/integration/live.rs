use std::time::Duration;

use tokio::sync::watch;

use crate::*;

use nodedb_core::node::MyNodeInfo;
use nodedb_core::query::NodeQuery;

const REFRESH_TIMEOUT: Duration = Duration::from_secs(2);

/// Waits until the live listing satisfies `pred`.
async fn wait_for(
    rx: &mut watch::Receiver<Vec<NodeRecord>>,
    pred: impl Fn(&[NodeRecord]) -> bool,
) -> Result<Vec<NodeRecord>> {
    let nodes = tokio::time::timeout(REFRESH_TIMEOUT, rx.wait_for(|nodes| pred(nodes)))
        .await
        .context("live listing did not refresh in time")??
        .clone();
    Ok(nodes)
}

#[tokio::test]
async fn test_live_listing_tracks_writes() -> Result<()> {
    let registry = memory_registry();
    registry.upsert(sighting(1, "Alpha", "A", 10))?;

    let mut rx = registry.subscribe_list(NodeQuery::sorted_by("alpha"))?;
    assert_eq!(nums(&rx.borrow()), vec![1]);

    registry.upsert(sighting(2, "Aardvark", "AA", 5))?;
    let nodes = wait_for(&mut rx, |n| n.len() == 2).await?;
    assert_eq!(nums(&nodes), vec![2, 1]);

    registry.set_my_node_info(MyNodeInfo::new(1))?;
    let nodes = wait_for(&mut rx, |n| n.first().map(|n| n.num) == Some(1)).await?;
    assert_eq!(nums(&nodes), vec![1, 2]);

    registry.delete_node(2)?;
    let nodes = wait_for(&mut rx, |n| n.len() == 1).await?;
    assert_eq!(nums(&nodes), vec![1]);

    registry.clear_all()?;
    wait_for(&mut rx, |n| n.is_empty()).await?;
    Ok(())
}

/// A live listing keeps its filter while following changes.
#[tokio::test]
async fn test_live_listing_keeps_filter() -> Result<()> {
    let registry = memory_registry();
    let mut rx = registry.subscribe_list(NodeQuery::default().with_filter("relay"))?;
    assert!(rx.borrow().is_empty());

    registry.upsert_all(vec![
        sighting(1, "Relay North", "RN", 1),
        sighting(2, "Base", "B", 2),
        sighting(3, "Relay South", "RS", 3),
    ])?;
    let nodes = wait_for(&mut rx, |n| !n.is_empty()).await?;
    assert_eq!(nums(&nodes), vec![3, 1]);
    Ok(())
}
