use crate::*;

use nodedb_core::node::{MetadataRecord, MyNodeInfo};
use nodedb_core::query::NodeQuery;

/// Nodes, metadata and local node info all come back after a restart.
#[test]
fn test_registry_survives_restart() -> Result<()> {
    let dir = scratch_dir("restart");
    let _ = std::fs::remove_dir_all(&dir);

    {
        let registry = persisted_registry(&dir)?;
        registry.set_my_node_info(MyNodeInfo {
            my_node_num: 1,
            model: Some("TBEAM".into()),
            ..Default::default()
        })?;
        registry.upsert_all(vec![
            keyed_sighting(1, "Home", "HOME", 10, 1),
            sighting(2, "Hilltop", "HILL", 20),
        ])?;
        registry.upsert_metadata(MetadataRecord {
            num: 2,
            firmware_version: "2.5.6".into(),
            hw_model: "RAK4631".into(),
            ..Default::default()
        })?;
    }

    let registry = persisted_registry(&dir)?;
    assert_eq!(
        registry.my_node_info()?.and_then(|m| m.model).as_deref(),
        Some("TBEAM")
    );
    let out = registry.list(&NodeQuery::default())?;
    assert_eq!(nums(&out), vec![1, 2]);
    let hill = registry.node_by_num(2)?.context("node should exist")?;
    assert_eq!(
        hill.metadata.map(|m| m.hw_model).as_deref(),
        Some("RAK4631")
    );

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// A recorded key conflict is not forgotten by a restart, and a pinned key
/// keeps rejecting impostors after one.
#[test]
fn test_identity_pins_survive_restart() -> Result<()> {
    let dir = scratch_dir("pins");
    let _ = std::fs::remove_dir_all(&dir);

    {
        let registry = persisted_registry(&dir)?;
        registry.upsert(keyed_sighting(3, "Pinned", "PIN", 1, 0x33))?;
        registry.upsert(keyed_sighting(4, "Victim", "VIC", 1, 0x44))?;
        registry.upsert(keyed_sighting(4, "Impostor", "IMP", 2, 0x45))?;
    }

    let registry = persisted_registry(&dir)?;
    let victim = registry.node_by_num(4)?.context("node should exist")?.node;
    assert!(victim.user.has_key_conflict());

    registry.upsert(keyed_sighting(3, "Pinned", "PIN", 3, 0x34))?;
    let pinned = registry.node_by_num(3)?.context("node should exist")?.node;
    assert!(pinned.user.has_key_conflict());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// Clearing the registry removes nodes from disk but keeps metadata.
#[test]
fn test_clear_all_persists() -> Result<()> {
    let dir = scratch_dir("clear");
    let _ = std::fs::remove_dir_all(&dir);

    {
        let registry = persisted_registry(&dir)?;
        registry.upsert_all(vec![sighting(1, "One", "1", 1), sighting(2, "Two", "2", 2)])?;
        registry.upsert_metadata(MetadataRecord {
            num: 1,
            ..Default::default()
        })?;
        registry.clear_all()?;
    }

    let registry = persisted_registry(&dir)?;
    assert!(registry.nodes_by_num()?.is_empty());
    assert!(registry.metadata(1)?.is_some());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
