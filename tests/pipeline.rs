use petgraph::algo::{connected_components, is_cyclic_undirected};
use surfnet::config::{GeoSettings, SyntheticSettings};
use surfnet::feature::SaddleKind;
use surfnet::{DataMap, SurfaceError, SurfaceNetwork, build_network, find_basin_saddles, synthetic};

/// Три вершины вокруг котловины: A (9) и B (8) по бокам, гребень C (4) снизу.
/// Перевалы: верхний гребень (3) A–B, (1, 4) = 3 A–C, (5, 4) = 2 B–C.
fn ring() -> DataMap {
    DataMap::from_rows(vec![
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        vec![0.0, 3.0, 3.0, 3.0, 3.0, 3.0, 0.0],
        vec![0.0, 3.0, 1.0, 1.0, 1.0, 3.0, 0.0],
        vec![0.0, 9.0, 1.0, 1.0, 1.0, 8.0, 0.0],
        vec![0.0, 3.0, 1.0, 1.0, 1.0, 2.0, 0.0],
        vec![0.0, 4.0, 4.0, 4.0, 4.0, 4.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ])
    .unwrap()
}

fn synthetic_map(seed: u64) -> DataMap {
    let settings = SyntheticSettings {
        seed,
        width: 64,
        height: 48,
        ..SyntheticSettings::default()
    };
    synthetic::generate(&settings, GeoSettings::default()).unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("surfnet-{}-{name}", std::process::id()))
}

#[test]
fn ring_drops_lowest_pass() {
    let map = ring();
    let network = build_network(&map);

    assert_eq!(network.summits.len(), 3);
    let saddles: Vec<_> = network
        .saddles
        .iter()
        .filter(|(_, s)| s.kind == SaddleKind::Saddle)
        .map(|(_, s)| (s.spot.coord(), s.disqualified()))
        .collect();
    assert_eq!(saddles, vec![((3, 1), false), ((1, 4), false), ((5, 4), true)]);

    let graph = network.to_graph();
    assert!(!is_cyclic_undirected(&graph));
    assert_eq!(graph.edge_count(), 4);
    // A, B, C и две седловины связаны; четыре угловых стока стоят отдельно
    assert_eq!(connected_components(&graph), 5);
}

#[test]
fn ring_runoffs_sit_in_corners() {
    let map = ring();
    let network = build_network(&map);
    let mut runoffs: Vec<_> = network
        .saddles
        .iter()
        .filter(|(_, s)| s.is_runoff())
        .map(|(_, s)| s.spot.coord())
        .collect();
    runoffs.sort_unstable();
    assert_eq!(runoffs, vec![(0, 0), (0, 6), (6, 0), (6, 6)]);
    assert!(
        network
            .saddles
            .iter()
            .filter(|(_, s)| s.is_runoff())
            .all(|(_, s)| !s.disqualified())
    );
}

#[test]
fn rerunning_basin_detection_changes_nothing() {
    let map = ring();
    let mut network = build_network(&map);
    let before = network.clone();
    assert_eq!(find_basin_saddles(&mut network), 0);
    assert_eq!(network, before);
}

#[test]
fn synthetic_network_invariants() {
    for seed in [1, 42, 2024] {
        let map = synthetic_map(seed);
        let network = build_network(&map);
        assert!(!network.summits.is_empty());

        for (id, saddle) in network.saddles.iter() {
            if saddle.is_runoff() || saddle.disqualified() {
                continue;
            }
            assert_eq!(saddle.high_shores.len(), 2, "{}", network.saddle_label(id));
            assert!(network.distinct_summits(id) >= 2, "{}", network.saddle_label(id));
        }

        for linker in &network.linkers {
            assert_eq!(linker.disqualified, network.saddles[linker.saddle].disqualified());
            assert!(!linker.path.is_empty());
        }

        let stats = network.stats();
        assert_eq!(stats.summits, network.summits.len());
        assert_eq!(stats.saddles + stats.runoffs, network.saddles.len());
    }
}

#[test]
fn split_children_point_back_to_edge_parent() {
    let map = synthetic_map(7);
    let network = build_network(&map);
    for (id, saddle) in network.saddles.iter() {
        for &child in &saddle.children {
            assert!(saddle.disqualified());
            assert!(saddle.edge);
            assert_eq!(network.saddles[child].parent, Some(id));
        }
    }
}

#[test]
fn saved_network_loads_and_stays_stable() {
    let map = synthetic_map(5);
    let network = build_network(&map);
    let path = temp_path("roundtrip.json");
    network.save_json(&map, &path).unwrap();

    let loaded = SurfaceNetwork::load_json(&path, &map).unwrap();
    assert_eq!(loaded, network);

    let other = synthetic_map(6);
    let err = SurfaceNetwork::load_json(&path, &other).unwrap_err();
    assert!(matches!(err, SurfaceError::ChecksumMismatch { .. }));
    std::fs::remove_file(&path).ok();
}

#[test]
fn voids_are_never_features() {
    let nodata = -32768.0;
    let map = DataMap::from_rows(vec![
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
        vec![0.0, 6.0, nodata, 7.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
    ])
    .unwrap();
    let network = build_network(&map);
    assert!(network.summits.iter().all(|(_, s)| s.spot.coord() != (2, 1)));
    assert!(network.saddles.iter().all(|(_, s)| s.spot.coord() != (2, 1)));
    assert_eq!(network.summits.len(), 2);
}
