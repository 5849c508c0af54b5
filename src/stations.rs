//! # Learning Stations
//!
//! The five fixed points of interest in the world. Each [`Station`] owns handles to its
//! scene nodes (platform, holographic display, label plate, demo object) and a single
//! `active` flag. Only the proximity activator flips that flag, through
//! [`Station::activate`] and [`Station::deactivate`], which also apply the visual emphasis:
//!
//! | state    | platform emissive       | demo object |
//! |----------|-------------------------|-------------|
//! | active   | station color at 0.5    | visible     |
//! | inactive | intensity 0             | hidden      |
//!
//! The registry keeps stations in declaration order; nearest-station ties resolve to the
//! earlier entry.

use nalgebra_glm as glm;

use crate::graph::{rgb, NodeId, SceneGraph};
use crate::ui::StationDisplay;

/// Emissive intensity of an active station's platform.
pub const HIGHLIGHT_INTENSITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    Pipeline,
    Lighting,
    Texturing,
    Geometry,
    Shaders,
}

impl StationKind {
    /// Declaration order, which is also the tie-break order.
    pub const ALL: [StationKind; 5] = [
        StationKind::Pipeline,
        StationKind::Lighting,
        StationKind::Texturing,
        StationKind::Geometry,
        StationKind::Shaders,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StationKind::Pipeline => "Pipeline",
            StationKind::Lighting => "Lighting",
            StationKind::Texturing => "Texturing",
            StationKind::Geometry => "Geometry",
            StationKind::Shaders => "Shaders",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StationKind::Pipeline => {
                "The graphics pipeline is the sequence of steps used to create a 2D representation \
                 of a 3D scene. Major stages include vertex processing, primitive assembly, \
                 rasterization, and fragment processing."
            }
            StationKind::Lighting => {
                "Lighting models simulate how light interacts with surfaces. Key concepts include \
                 ambient, diffuse, and specular lighting, as well as shadows and global \
                 illumination techniques."
            }
            StationKind::Texturing => {
                "Texturing applies image data to 3D models to add detail without increasing \
                 geometric complexity. Techniques include UV mapping, mipmapping, and normal \
                 mapping."
            }
            StationKind::Geometry => {
                "Geometry in computer graphics involves creating and manipulating 3D shapes. This \
                 includes mesh representation, subdivision surfaces, and procedural geometry \
                 generation."
            }
            StationKind::Shaders => {
                "Shaders are programs that run on the GPU to determine how objects are rendered. \
                 They control vertex positions, lighting calculations, and pixel colors."
            }
        }
    }

    pub fn color(self) -> u32 {
        match self {
            StationKind::Pipeline => 0x4caf50,
            StationKind::Lighting => 0xffc107,
            StationKind::Texturing => 0x2196f3,
            StationKind::Geometry => 0xe91e63,
            StationKind::Shaders => 0x9c27b0,
        }
    }

    pub fn position(self) -> glm::Vec3 {
        match self {
            StationKind::Pipeline => glm::vec3(-15.0, 0.0, -15.0),
            StationKind::Lighting => glm::vec3(15.0, 0.0, -15.0),
            StationKind::Texturing => glm::vec3(-15.0, 0.0, 15.0),
            StationKind::Geometry => glm::vec3(15.0, 0.0, 15.0),
            StationKind::Shaders => glm::vec3(0.0, 0.0, -25.0),
        }
    }
}

/// Scene nodes that make up one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationVisuals {
    pub platform: NodeId,
    pub display: NodeId,
    pub label: NodeId,
    pub demo: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub kind: StationKind,
    pub position: glm::Vec3,
    pub visuals: StationVisuals,
    active: bool,
}

impl Station {
    pub fn new(kind: StationKind, visuals: StationVisuals) -> Self {
        Self {
            kind,
            position: kind.position(),
            visuals,
            active: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Highlights the platform, reveals the demo and tells the UI about the station.
    pub fn activate(&mut self, graph: &mut SceneGraph, display: &mut dyn StationDisplay) {
        let platform = &mut graph.node_mut(self.visuals.platform).material;
        platform.emissive = rgb(self.kind.color());
        platform.emissive_intensity = HIGHLIGHT_INTENSITY;
        graph.set_visible(self.visuals.demo, true);

        display.show_station(self.kind.name(), self.kind.description());
        self.active = true;
    }

    pub fn deactivate(&mut self, graph: &mut SceneGraph) {
        graph.node_mut(self.visuals.platform).material.emissive_intensity = 0.0;
        graph.set_visible(self.visuals.demo, false);
        self.active = false;
    }
}

/// All stations, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Station> {
        self.stations.get_mut(index)
    }

    pub fn find(&self, kind: StationKind) -> Option<usize> {
        self.stations.iter().position(|s| s.kind == kind)
    }

    pub fn active_count(&self) -> usize {
        self.stations.iter().filter(|s| s.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Material, Node};
    use crate::ui::UiState;

    fn station(graph: &mut SceneGraph, kind: StationKind) -> Station {
        let platform = graph.add(Node::group());
        let display = graph.add(Node::group());
        let label = graph.add(Node::group());
        let demo = graph.add(Node::group().hidden());
        graph.node_mut(platform).material = Material::standard(kind.color());
        Station::new(
            kind,
            StationVisuals {
                platform,
                display,
                label,
                demo,
            },
        )
    }

    #[test]
    fn test_declaration_order_and_positions() {
        let names: Vec<_> = StationKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["Pipeline", "Lighting", "Texturing", "Geometry", "Shaders"]);
        assert_eq!(StationKind::Shaders.position(), glm::vec3(0.0, 0.0, -25.0));
    }

    #[test]
    fn test_activate_then_deactivate_toggles_visuals() {
        let mut graph = SceneGraph::new();
        let mut ui = UiState::default();
        let mut s = station(&mut graph, StationKind::Lighting);

        s.activate(&mut graph, &mut ui);
        assert!(s.is_active());
        let platform = graph.node(s.visuals.platform).material;
        assert_eq!(platform.emissive, rgb(0xffc107));
        assert_eq!(platform.emissive_intensity, HIGHLIGHT_INTENSITY);
        assert!(graph.is_visible(s.visuals.demo));
        assert_eq!(ui.current_topic(), "Lighting");

        s.deactivate(&mut graph);
        assert!(!s.is_active());
        assert_eq!(graph.node(s.visuals.platform).material.emissive_intensity, 0.0);
        assert!(!graph.is_visible(s.visuals.demo));
    }

    #[test]
    fn test_registry_lookup() {
        let mut graph = SceneGraph::new();
        let registry = StationRegistry::new(
            StationKind::ALL
                .iter()
                .map(|&k| station(&mut graph, k))
                .collect(),
        );
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.find(StationKind::Geometry), Some(3));
        assert_eq!(registry.active_count(), 0);
    }
}
