#![allow(dead_code)]

use cartomap::{MapConfig, RenderCoordinator, Topology, Viewport};

/// Three strips in the central US, as the host would send them.
///
/// ```
/// +---+---+-------+
/// | a | b |   c   |   pop: 10, 20, 70
/// +---+---+-------+
/// ```
pub const STRIPS: &str = r#"{
    "arcs": [
        [[-99, 38], [-99, 40]],
        [[-98, 38], [-98, 40]],
        [[-99, 40], [-100, 40], [-100, 38], [-99, 38]],
        [[-98, 40], [-99, 40]],
        [[-99, 38], [-98, 38]],
        [[-98, 38], [-96, 38], [-96, 40], [-98, 40]]
    ],
    "regions": [
        { "id": "a", "properties": { "pop": 10, "name": "West" }, "polygons": [[[0, 2]]] },
        { "id": "b", "properties": { "pop": 20, "name": "Middle" }, "polygons": [[[4, 1, 3, -1]]] },
        { "id": "c", "properties": { "pop": 70, "name": "East" }, "polygons": [[[5, -2]]] }
    ]
}"#;

pub fn strips() -> Topology {
    serde_json::from_str(STRIPS).unwrap()
}

pub const THRESHOLD_OPTIONS: &str = r##"{
    "colors": {
        "color_type": "threshold",
        "color_var": "pop",
        "scale": { "breaks": [15, 50], "colors": ["#a", "#b", "#c"] }
    },
    "legend": true,
    "legend_opts": { "title": "Population" }
}"##;

/// A rendered coordinator for `options` over the strips fixture.
pub fn rendered(options: &str) -> RenderCoordinator {
    let config = MapConfig::from_json(options).unwrap();
    let mut coordinator = RenderCoordinator::new(config);
    coordinator.fit(strips(), Viewport::new(960.0, 500.0)).unwrap();
    coordinator.render().unwrap();
    coordinator
}

pub fn paths(scene: &cartomap::Scene) -> Vec<String> {
    scene.regions.iter().map(|r| r.path.clone()).collect()
}
