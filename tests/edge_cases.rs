use geocluster::prelude::*;
use geocluster::{MapPoint, WORLD_SIZE};
use std::sync::Arc;

struct Immediate;

impl Presenter for Immediate {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }

    fn is_presentation_context(&self) -> bool {
        true
    }

    fn remove_markers(&self, _markers: &[Marker]) {}

    fn add_markers(&self, _markers: &[Marker]) {}
}

fn manager(config: ClusterConfig) -> ClusterManager {
    ClusterManagerBuilder::new()
        .presenter(Arc::new(Immediate))
        .config(config)
        .build()
        .expect("Failed to build manager")
}

fn member_total(delta: &Delta) -> usize {
    delta.to_add.iter().map(|m| m.annotations().len()).sum()
}

/// Test 1: Large dataset stays conserved through a pass
#[test]
fn test_large_dataset_pass() {
    let manager = manager(ClusterConfig::default());
    let items: Vec<_> = (0..10_000)
        .map(|i| {
            let lat = 40.0 + (i % 100) as f64 * 0.001;
            let lon = -74.0 + (i / 100) as f64 * 0.001;
            Arc::new(Annotation::new(Coordinate::new(lon, lat)))
        })
        .collect();
    assert_eq!(manager.add_all(items).unwrap(), 10_000);

    let rect =
        MapRect::from_coordinates(&Coordinate::new(-74.5, 40.5), &Coordinate::new(-73.5, 39.5));
    let outcome = manager.compute_pass(2f64.powi(-8), &rect, &CancellationToken::new());
    let delta = outcome.into_delta().unwrap();
    assert_eq!(member_total(&delta), 10_000);
    assert!(delta.to_add.len() < 10_000);
}

/// Test 2: Extreme coordinate values
#[test]
fn test_extreme_coordinates() {
    let manager = manager(ClusterConfig::default());
    let extremes = [
        (180.0, 0.0),
        (-180.0, 0.0),
        (0.0, 90.0),
        (0.0, -90.0),
        (180.0, 90.0),
        (-180.0, -90.0),
    ];
    for (lon, lat) in extremes {
        manager
            .add(Arc::new(Annotation::new(Coordinate::new(lon, lat))))
            .unwrap_or_else(|_| panic!("Failed to add ({}, {})", lon, lat));
    }
    assert_eq!(manager.annotations().len(), extremes.len());
}

/// Test 3: Invalid coordinates are rejected
#[test]
fn test_invalid_coordinates() {
    let manager = manager(ClusterConfig::default());
    for (lon, lat) in [
        (181.0, 0.0),
        (0.0, -90.5),
        (f64::NAN, 0.0),
        (0.0, f64::INFINITY),
    ] {
        let result = manager.add(Arc::new(Annotation::new(Coordinate::new(lon, lat))));
        assert!(matches!(result, Err(ClusterError::InvalidCoordinate(_))));
    }
    assert!(manager.annotations().is_empty());
}

/// Test 4: Viewport crossing the antimeridian
#[test]
fn test_antimeridian_viewport() {
    let manager = manager(ClusterConfig::default());
    let east = Arc::new(Annotation::new(Coordinate::new(179.999, 0.0)));
    let west = Arc::new(Annotation::new(Coordinate::new(-179.999, 0.0)));
    manager.add_all([east.clone(), west.clone()]).unwrap();

    let y = MapPoint::from_coordinate(&Coordinate::new(0.0, 0.0)).y;
    let rect = MapRect::new(WORLD_SIZE - 1_000.0, y - 500.0, 2_000.0, 1_000.0);
    let delta = manager
        .compute_pass(1.0, &rect, &CancellationToken::new())
        .into_delta()
        .unwrap();

    let ids: Vec<_> = delta
        .to_add
        .iter()
        .flat_map(|m| m.annotations().iter().map(|a| a.id()))
        .collect();
    assert!(ids.contains(&east.id()));
    assert!(ids.contains(&west.id()));
}

/// Test 5: Unusable zoom scales complete with nothing to do
#[test]
fn test_unusable_zoom_scale() {
    let manager = manager(ClusterConfig::default());
    manager
        .add(Arc::new(Annotation::new(Coordinate::new(0.0, 0.0))))
        .unwrap();
    let rect = MapRect::from_coordinates(&Coordinate::new(-1.0, 1.0), &Coordinate::new(1.0, -1.0));

    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let outcome = manager.compute_pass(scale, &rect, &CancellationToken::new());
        assert!(outcome.delta().unwrap().is_empty());
    }
    assert!(manager.visible_annotations().is_empty());
}

/// Test 6: Invalid custom cell sizes fall back to the adaptive policy
#[test]
fn test_invalid_custom_cell_size() {
    let config = ClusterConfig::default().with_cell_size_fn(|_| CellSize::new(0.0, f64::NAN));
    assert_eq!(config.cell_size_for(1.0), CellSize::square(16.0));

    let manager = manager(config);
    manager
        .add_all((0..3).map(|i| Arc::new(Annotation::new(Coordinate::new(i as f64 * 1e-5, 0.0)))))
        .unwrap();
    let rect = MapRect::from_coordinates(&Coordinate::new(-0.5, 0.5), &Coordinate::new(0.5, -0.5));
    let delta = manager
        .compute_pass(2f64.powi(-10), &rect, &CancellationToken::new())
        .into_delta()
        .unwrap();
    assert_eq!(member_total(&delta), 3);
}

/// Test 7: Configuration from JSON
#[test]
fn test_config_from_json() {
    let config = ClusterConfig::from_json(
        r#"{
            "min_count_for_clustering": 4,
            "should_remove_invisible_annotations": false,
            "cluster_position": "average"
        }"#,
    )
    .unwrap();
    assert_eq!(config.min_count_for_clustering, 4);
    assert!(!config.should_remove_invisible_annotations);
    assert_eq!(config.cluster_position, ClusterPosition::Average);
    assert!(config.should_distribute_annotations_on_same_coordinate);

    assert!(ClusterConfig::from_json(r#"{ "max_zoom_level": 42 }"#).is_err());
    assert!(matches!(
        ClusterConfig::from_json("not json"),
        Err(ClusterError::Serialization(_))
    ));
}

/// Test 8: Distribution disabled keeps coincident annotations in place
#[test]
fn test_distribution_disabled() {
    let manager = manager(ClusterConfig::default().with_distribute_on_same_coordinate(false));
    let items: Vec<_> = (0..3)
        .map(|_| Arc::new(Annotation::new(Coordinate::new(5.0, 5.0))))
        .collect();
    manager.add_all(items.clone()).unwrap();

    let rect = MapRect::from_coordinates(&Coordinate::new(4.9, 5.1), &Coordinate::new(5.1, 4.9));
    let delta = manager
        .compute_pass(2f64.powi(-10), &rect, &CancellationToken::new())
        .into_delta()
        .unwrap();
    assert_eq!(delta.to_add.len(), 1);
    assert!(items.iter().all(|a| a.coordinate() == Coordinate::new(5.0, 5.0)));
}
