use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drivetree::models::{FolderNode, NodeStatus, ROOT_FOLDER_ID};
use drivetree::services::drive::{ArchiveService, ConcurrencyConfig, PageMode};
use drivetree::test_utils::InMemoryDrive;

const NAME_POOL: &[&str] = &["alpha", "Beta", "gamma", "Delta", "2024", "01ENERO", "zeta", "Eta"];

/// Seeds a random hierarchy of the given height under `parent_id`
fn populate(drive: &InMemoryDrive, rng: &mut StdRng, parent_id: &str, levels_left: usize) {
    if levels_left == 0 {
        return;
    }

    for _ in 0..rng.gen_range(0..4) {
        let name = NAME_POOL[rng.gen_range(0..NAME_POOL.len())];
        let child = drive.add_folder(parent_id, name);
        populate(drive, rng, &child, levels_left - 1);
    }

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..rng.gen_range(0..3) {
        let created = if rng.gen_bool(0.2) {
            None
        } else {
            Some(base + Duration::hours(rng.gen_range(0..10_000)))
        };
        drive.add_file(parent_id, &format!("file-{}.pdf", i), created);
    }
}

fn assert_ordering(node: &FolderNode) {
    let children = node.children();
    let split = children.iter().position(|c| !c.is_folder).unwrap_or(children.len());

    assert!(children[split..].iter().all(|c| !c.is_folder), "folders must precede files under {}", node.name);

    for pair in children[..split].windows(2) {
        assert!(
            pair[0].name.to_lowercase() <= pair[1].name.to_lowercase(),
            "folders out of order under {}: {} > {}",
            node.name,
            pair[0].name,
            pair[1].name
        );
    }

    for pair in children[split..].windows(2) {
        match (pair[0].created_at, pair[1].created_at) {
            (Some(a), Some(b)) => assert!(a >= b, "files out of order under {}", node.name),
            (None, Some(_)) => panic!("undated file sorted before a dated one under {}", node.name),
            _ => {}
        }
    }

    for child in children.iter().filter(|c| c.is_folder) {
        assert_ordering(child);
    }
}

/// Folder nodes at exactly `max_depth` must be unexpanded
fn assert_frontier(node: &FolderNode, depth: usize, max_depth: usize) {
    assert!(depth <= max_depth + 1);
    if !node.is_folder {
        assert!(node.children.is_none());
        return;
    }

    assert!(node.children.is_some(), "visited folder {} must carry children", node.name);
    if depth == max_depth {
        assert!(node.children().is_empty());
        assert_eq!(node.status, Some(NodeStatus::Truncated));
    }
    for child in node.children() {
        assert_frontier(child, depth + 1, max_depth);
    }
}

#[tokio::test]
async fn test_random_trees_respect_depth_and_ordering() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let drive = Arc::new(InMemoryDrive::new().with_page_size(3));
        let top = drive.add_folder(ROOT_FOLDER_ID, "top");
        populate(&drive, &mut rng, &top, 5);

        let max_depth = rng.gen_range(0..5);
        let service = ArchiveService::new_with_config(
            drive.clone(),
            ConcurrencyConfig {
                max_in_flight_requests: rng.gen_range(1..6),
                page_mode: PageMode::FollowCursor { max_pages: 100 },
            },
        )
        .unwrap();

        let tree = service.build_tree(&top, max_depth).await.unwrap();

        assert!(tree.height() <= max_depth, "seed {}: height {} > {}", seed, tree.height(), max_depth);
        assert_ordering(&tree);
        assert_frontier(&tree, 0, max_depth);
        assert!(drive.peak_in_flight() <= service.concurrency_config().max_in_flight_requests);
    }
}

#[tokio::test]
async fn test_rebuilding_an_unchanged_tree_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let drive = Arc::new(InMemoryDrive::new());
    let top = drive.add_folder(ROOT_FOLDER_ID, "top");
    populate(&drive, &mut rng, &top, 4);

    let service = ArchiveService::new(drive.clone());
    let first = service.build_tree(&top, 4).await.unwrap();
    let second = service.build_tree(&top, 4).await.unwrap();

    assert_eq!(first, second);
}
