//! # Proximity Activator
//!
//! Once per frame the activator looks for the station nearest to the camera. A station
//! counts as near when its distance is strictly below the activation radius; among near
//! stations the closest wins, and exact ties go to the station declared first.
//!
//! Transitions keep at most one station active:
//!
//! - a different station is nearest: the previous one is deactivated first, then the new
//!   one is activated;
//! - nothing is near any more: the previous one is deactivated and the UI goes back to its
//!   "Explore" text;
//! - the nearest station is already the active one, or nothing was and nothing is near:
//!   no change.

use nalgebra_glm as glm;

use crate::graph::SceneGraph;
use crate::stations::StationRegistry;
use crate::ui::StationDisplay;

/// What one activator pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityChange {
    Activated { previous: Option<usize>, current: usize },
    Cleared { previous: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityActivator {
    radius: f32,
    active: Option<usize>,
}

impl ProximityActivator {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            active: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Index of the active station in the registry.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Nearest station strictly within the radius, with its distance.
    pub fn nearest(&self, position: &glm::Vec3, stations: &StationRegistry) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (index, station) in stations.iter().enumerate() {
            let distance = glm::distance(position, &station.position);
            let limit = best.map_or(self.radius, |(_, d)| d);
            if distance < limit {
                best = Some((index, distance));
            }
        }
        best
    }

    /// Runs one activation pass for a camera at `position`.
    pub fn update(
        &mut self,
        position: &glm::Vec3,
        stations: &mut StationRegistry,
        graph: &mut SceneGraph,
        display: &mut dyn StationDisplay,
    ) -> Option<ProximityChange> {
        if stations.is_empty() {
            return None;
        }

        let nearest = self.nearest(position, stations).map(|(index, _)| index);
        if nearest == self.active {
            return None;
        }

        let previous = self.active.take();
        if let Some(station) = previous.and_then(|index| stations.get_mut(index)) {
            station.deactivate(graph);
        }

        match nearest.and_then(|index| stations.get_mut(index).map(|s| (index, s))) {
            Some((index, station)) => {
                log::info!("Approaching {} station", station.name());
                station.activate(graph, display);
                self.active = Some(index);
                Some(ProximityChange::Activated {
                    previous,
                    current: index,
                })
            }
            None => {
                display.show_explore();
                previous.map(|previous| ProximityChange::Cleared { previous })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Material, Node};
    use crate::stations::{Station, StationKind, StationVisuals};
    use crate::ui::UiState;

    /// Records UI calls, and the station states at the moment of each call.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl StationDisplay for Recorder {
        fn show_station(&mut self, name: &str, _description: &str) {
            self.calls.push(format!("show {name}"));
        }

        fn show_explore(&mut self) {
            self.calls.push("explore".to_string());
        }
    }

    fn world() -> (SceneGraph, StationRegistry) {
        let mut graph = SceneGraph::new();
        let stations = StationKind::ALL
            .iter()
            .map(|&kind| {
                let platform = graph.add(Node::group());
                graph.node_mut(platform).material = Material::standard(kind.color());
                let visuals = StationVisuals {
                    platform,
                    display: graph.add(Node::group()),
                    label: graph.add(Node::group()),
                    demo: graph.add(Node::group().hidden()),
                };
                Station::new(kind, visuals)
            })
            .collect();
        (graph, StationRegistry::new(stations))
    }

    fn at(kind: StationKind) -> glm::Vec3 {
        kind.position()
    }

    #[test]
    fn test_camera_on_pipeline_activates_it() {
        let (mut graph, mut stations) = world();
        let mut ui = UiState::default();
        let mut activator = ProximityActivator::new(5.0);

        let change = activator.update(&at(StationKind::Pipeline), &mut stations, &mut graph, &mut ui);
        assert_eq!(
            change,
            Some(ProximityChange::Activated {
                previous: None,
                current: 0
            })
        );
        assert!(stations.get(0).unwrap().is_active());
        assert_eq!(ui.current_topic(), "Pipeline");
        assert_eq!(ui.topic_description(), StationKind::Pipeline.description());
    }

    #[test]
    fn test_moving_between_stations_deactivates_first() {
        let (mut graph, mut stations) = world();
        let mut activator = ProximityActivator::new(5.0);
        let mut recorder = Recorder::default();

        activator.update(&at(StationKind::Pipeline), &mut stations, &mut graph, &mut recorder);
        let pipeline = stations.get(0).unwrap().visuals;

        let change = activator.update(
            &(at(StationKind::Lighting) + glm::vec3(1.0, 1.6, 1.0)),
            &mut stations,
            &mut graph,
            &mut recorder,
        );
        assert_eq!(
            change,
            Some(ProximityChange::Activated {
                previous: Some(0),
                current: 1
            })
        );
        assert_eq!(graph.node(pipeline.platform).material.emissive_intensity, 0.0);
        assert!(!graph.is_visible(pipeline.demo));
        assert!(stations.get(1).unwrap().is_active());
        assert_eq!(stations.active_count(), 1);
        assert_eq!(recorder.calls, ["show Pipeline", "show Lighting"]);
    }

    #[test]
    fn test_far_from_everything_resets_to_explore() {
        let (mut graph, mut stations) = world();
        let mut ui = UiState::default();
        let mut activator = ProximityActivator::new(5.0);

        activator.update(&at(StationKind::Geometry), &mut stations, &mut graph, &mut ui);
        // Ten units above Geometry; every other station is farther still.
        let far = at(StationKind::Geometry) + glm::vec3(0.0, 10.0, 0.0);
        let change = activator.update(&far, &mut stations, &mut graph, &mut ui);

        assert_eq!(change, Some(ProximityChange::Cleared { previous: 3 }));
        assert_eq!(activator.active(), None);
        assert_eq!(stations.active_count(), 0);
        assert_eq!(ui.current_topic(), "Explore");
    }

    #[test]
    fn test_radius_is_exclusive() {
        let (mut graph, mut stations) = world();
        let mut activator = ProximityActivator::new(5.0);
        let mut recorder = Recorder::default();

        let edge = at(StationKind::Shaders) + glm::vec3(0.0, 0.0, -5.0);
        assert_eq!(activator.update(&edge, &mut stations, &mut graph, &mut recorder), None);
        let inside = at(StationKind::Shaders) + glm::vec3(0.0, 0.0, -4.99);
        assert!(activator.update(&inside, &mut stations, &mut graph, &mut recorder).is_some());
    }

    #[test]
    fn test_staying_near_the_same_station_is_quiet() {
        let (mut graph, mut stations) = world();
        let mut activator = ProximityActivator::new(5.0);
        let mut recorder = Recorder::default();

        let p = at(StationKind::Texturing);
        activator.update(&p, &mut stations, &mut graph, &mut recorder);
        let again = activator.update(&(p + glm::vec3(1.0, 0.0, 0.0)), &mut stations, &mut graph, &mut recorder);
        assert_eq!(again, None);
        assert_eq!(recorder.calls.len(), 1);
    }

    #[test]
    fn test_ties_resolve_to_declaration_order() {
        let mut graph = SceneGraph::new();
        let make = |graph: &mut SceneGraph, kind| {
            let visuals = StationVisuals {
                platform: graph.add(Node::group()),
                display: graph.add(Node::group()),
                label: graph.add(Node::group()),
                demo: graph.add(Node::group().hidden()),
            };
            Station::new(kind, visuals)
        };
        let mut a = make(&mut graph, StationKind::Lighting);
        let mut b = make(&mut graph, StationKind::Pipeline);
        a.position = glm::vec3(-1.0, 0.0, 0.0);
        b.position = glm::vec3(1.0, 0.0, 0.0);
        let stations = StationRegistry::new(vec![a, b]);

        let activator = ProximityActivator::new(5.0);
        assert_eq!(activator.nearest(&glm::Vec3::zeros(), &stations), Some((0, 1.0)));
    }

    #[test]
    fn test_empty_registry_is_a_no_op() {
        let mut graph = SceneGraph::new();
        let mut stations = StationRegistry::default();
        let mut activator = ProximityActivator::new(5.0);
        let mut recorder = Recorder::default();
        assert_eq!(
            activator.update(&glm::Vec3::zeros(), &mut stations, &mut graph, &mut recorder),
            None
        );
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_mutual_exclusion_along_a_walk() {
        let (mut graph, mut stations) = world();
        let mut activator = ProximityActivator::new(5.0);
        let mut recorder = Recorder::default();

        // Walk a loop that passes by every station and the empty space between them.
        let waypoints: Vec<glm::Vec3> = StationKind::ALL.iter().map(|k| k.position()).collect();
        for pair in waypoints.windows(2) {
            for step in 0..=40 {
                let t = step as f32 / 40.0;
                let p = glm::lerp(&pair[0], &pair[1], t) + glm::vec3(0.0, 1.6, 0.0);
                activator.update(&p, &mut stations, &mut graph, &mut recorder);
                assert!(stations.active_count() <= 1);

                let expected = activator.nearest(&p, &stations).map(|(i, _)| i);
                assert_eq!(activator.active(), expected);
                for (index, station) in stations.iter().enumerate() {
                    assert_eq!(station.is_active(), Some(index) == activator.active());
                }
            }
        }
    }
}
