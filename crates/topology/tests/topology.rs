use geo::{Area, Coord};
use maptopo::{ArcRef, AttrValue, Region, Topology, TopologyError};

fn c(x: f64, y: f64) -> Coord<f64> { Coord { x, y } }

/// Three strips side by side, sharing two vertical borders.
///
/// ```
/// +---+---+-------+
/// | a | b |   c   |
/// +---+---+-------+
/// 0   1   2       4
/// ```
fn strips() -> Topology {
    let arcs = vec![
        vec![c(1.0, 0.0), c(1.0, 2.0)],                             // 0: a|b
        vec![c(2.0, 0.0), c(2.0, 2.0)],                             // 1: b|c
        vec![c(1.0, 2.0), c(0.0, 2.0), c(0.0, 0.0), c(1.0, 0.0)],   // 2: a outer
        vec![c(2.0, 2.0), c(1.0, 2.0)],                             // 3: b top
        vec![c(1.0, 0.0), c(2.0, 0.0)],                             // 4: b bottom
        vec![c(2.0, 0.0), c(4.0, 0.0), c(4.0, 2.0), c(2.0, 2.0)],   // 5: c outer
    ];
    let regions = vec![
        Region::new("a", vec![vec![vec![ArcRef::forward(0), ArcRef::forward(2)]]])
            .with_property("pop", 10.0),
        Region::new("b", vec![vec![vec![
            ArcRef::forward(4), ArcRef::forward(1), ArcRef::forward(3), ArcRef::reverse(0),
        ]]])
            .with_property("pop", 20.0),
        Region::new("c", vec![vec![vec![ArcRef::forward(5), ArcRef::reverse(1)]]])
            .with_property("pop", "NA"),
    ];
    Topology::new(arcs, regions).unwrap()
}

#[test]
fn shapes_have_expected_areas() {
    let topo = strips();
    let areas = topo.shapes(topo.arcs()).iter()
        .map(|shape| shape.unsigned_area())
        .collect::<Vec<_>>();
    assert_eq!(areas, vec![2.0, 2.0, 4.0]);
}

#[test]
fn rings_are_closed() {
    let topo = strips();
    for shape in topo.shapes(topo.arcs()) {
        let exterior = shape.0[0].exterior();
        assert_eq!(exterior.0.first(), exterior.0.last());
    }
}

#[test]
fn interior_arcs_are_shared_borders() {
    let topo = strips();
    assert_eq!(topo.interior_arcs(), vec![0, 1]);
    assert_eq!(topo.mesh(topo.arcs()).0.len(), 2);
}

#[test]
fn region_lookup_by_id() {
    let topo = strips();
    assert_eq!(topo.region_index("b"), Some(1));
    assert_eq!(topo.region_index("z"), None);
    assert_eq!(topo.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert!(topo.regions()[2].attribute("pop").unwrap().is_na());
}

#[test]
fn bounds_cover_all_arcs() {
    let topo = strips();
    let bounds = topo.bounds().unwrap();
    assert_eq!(bounds.min(), c(0.0, 0.0));
    assert_eq!(bounds.max(), c(4.0, 2.0));
}

#[test]
fn missing_arc_is_rejected() {
    let arcs = vec![vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 1.0), c(0.0, 0.0)]];
    let regions = vec![Region::new("x", vec![vec![vec![ArcRef::reverse(3)]]])];
    assert_eq!(
        Topology::new(arcs, regions).unwrap_err(),
        TopologyError::MissingArc { region: "x".into(), arc: 3, len: 1 },
    );
}

#[test]
fn duplicate_ids_are_rejected() {
    let arcs = vec![vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 1.0), c(0.0, 0.0)]];
    let ring = vec![vec![vec![ArcRef::forward(0)]]];
    let regions = vec![Region::new("x", ring.clone()), Region::new("x", ring)];
    assert_eq!(
        Topology::new(arcs, regions).unwrap_err(),
        TopologyError::DuplicateRegion("x".into()),
    );
}

#[test]
fn deserializes_from_json() {
    let json = r#"{
        "arcs": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]],
        "regions": [
            { "id": "sq", "properties": { "name": "square", "v": 3 }, "polygons": [[[0]]] }
        ]
    }"#;
    let topo: Topology = serde_json::from_str(json).unwrap();
    assert_eq!(topo.num_regions(), 1);
    assert_eq!(topo.regions()[0].attribute("v"), Some(&AttrValue::Number(3.0)));
    assert_eq!(topo.shape(0, topo.arcs()).unsigned_area(), 1.0);
}

#[test]
fn deserialization_validates_references() {
    let json = r#"{ "arcs": [], "regions": [{ "id": "sq", "polygons": [[[0]]] }] }"#;
    assert!(serde_json::from_str::<Topology>(json).is_err());
}
