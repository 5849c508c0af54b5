//! # UI Bridge
//!
//! Holds every piece of on-screen state outside the 3D view and draws it with `egui`. Every
//! widget carries a stable id:
//!
//! | id                    | widget                                             |
//! |-----------------------|----------------------------------------------------|
//! | `ui-panel`            | right side panel with topic, navigation and toggles |
//! | `current-topic`       | panel heading                                      |
//! | `topic-description`   | panel body text                                    |
//! | `info-panel`          | transient "Approaching" message                    |
//! | `tooltip`             | hover text next to the cursor                      |
//! | `crosshair`           | ring at the screen centre in first-person mode     |
//! | `instructions`        | "Click to explore" overlay                         |
//! | `nav-*`               | navigation buttons                                 |
//! | `reset-view`, `toggle-wireframe`, `toggle-animation` | panel buttons       |
//!
//! ## Time
//!
//! The state never reads the clock itself. [`UiState::tick`] hands it the current
//! [`Instant`] once per frame, which expires the info message and the loading screen. This
//! keeps the whole bridge testable without a window.
//!
//! ## Actions
//!
//! Buttons that affect things outside the UI (camera reset, control-scheme switch, pointer
//! lock) are queued as [`UiActions`] and collected by the frame driver with
//! [`UiState::take_actions`].

use web_time::{Duration, Instant};

use crate::config::{ControlScheme, UiTimings};

pub const EXPLORE_TOPIC: &str = "Explore";
pub const EXPLORE_DESCRIPTION: &str =
    "Move around the 3D world to discover learning stations about computer graphics concepts.";
const NAV_FALLBACK: &str = "Select a topic to learn more about computer graphics concepts.";

/// Receives station changes from the proximity activator.
pub trait StationDisplay {
    /// Shows the station's topic, announces it and opens the panel.
    fn show_station(&mut self, name: &str, description: &str);
    /// Returns the panel text to the default "Explore" prompt.
    fn show_explore(&mut self);
}

/// Topics reachable from the navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavTopic {
    Overview,
    Pipeline,
    Lighting,
    Texturing,
    Geometry,
}

impl NavTopic {
    pub const ALL: [NavTopic; 5] = [
        NavTopic::Overview,
        NavTopic::Pipeline,
        NavTopic::Lighting,
        NavTopic::Texturing,
        NavTopic::Geometry,
    ];

    pub fn id(self) -> &'static str {
        match self {
            NavTopic::Overview => "nav-overview",
            NavTopic::Pipeline => "nav-pipeline",
            NavTopic::Lighting => "nav-lighting",
            NavTopic::Texturing => "nav-texturing",
            NavTopic::Geometry => "nav-geometry",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NavTopic::Overview => "Overview",
            NavTopic::Pipeline => "Pipeline",
            NavTopic::Lighting => "Lighting",
            NavTopic::Texturing => "Texturing",
            NavTopic::Geometry => "Geometry",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            NavTopic::Pipeline => {
                "The graphics pipeline is the sequence of steps that transforms 3D data into a 2D \
                 image. Key stages include vertex processing, rasterization, and fragment \
                 processing."
            }
            NavTopic::Lighting => {
                "Lighting models simulate how light interacts with surfaces. This includes \
                 ambient, diffuse, and specular components that create realistic illumination."
            }
            NavTopic::Texturing => {
                "Texturing maps 2D images onto 3D surfaces to add detail without increasing \
                 geometric complexity. UV coordinates determine how textures wrap."
            }
            NavTopic::Geometry => {
                "Geometry in 3D graphics consists of vertices, edges, and faces that define the \
                 shape of objects. Different rendering techniques affect how these appear."
            }
            NavTopic::Overview => NAV_FALLBACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoMessage {
    pub title: String,
    pub body: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub text: &'static str,
    /// Cursor position in logical pixels.
    pub position: [f32; 2],
}

/// A station name drawn above its label plate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationLabel {
    pub text: &'static str,
    /// Screen position in logical pixels.
    pub position: [f32; 2],
    pub color: [f32; 3],
}

/// Requests from the UI for the rest of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiActions {
    pub reset_view: bool,
    pub switch_scheme: bool,
    pub request_pointer_lock: bool,
}

#[derive(Debug, Clone)]
pub struct UiState {
    timings: UiTimings,
    now: Instant,
    current_topic: String,
    topic_description: String,
    panel_visible: bool,
    info: Option<InfoMessage>,
    tooltip: Option<Tooltip>,
    active_nav: NavTopic,
    wireframe: bool,
    animation_active: bool,
    instructions_visible: bool,
    loading_until: Instant,
    renderer_ready: bool,
    pending: UiActions,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(UiTimings::default(), Instant::now())
    }
}

impl UiState {
    pub fn new(timings: UiTimings, now: Instant) -> Self {
        Self {
            timings,
            now,
            current_topic: NavTopic::Overview.label().to_string(),
            topic_description: NavTopic::Overview.description().to_string(),
            panel_visible: false,
            info: None,
            tooltip: None,
            active_nav: NavTopic::Overview,
            wireframe: false,
            animation_active: true,
            instructions_visible: true,
            loading_until: now + Duration::from_millis(timings.loading_screen_ms),
            renderer_ready: false,
            pending: UiActions::default(),
        }
    }

    /// Advances the UI clock, dropping anything that has timed out.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        if self.info.as_ref().is_some_and(|info| now >= info.expires_at) {
            self.info = None;
        }
    }

    pub fn current_topic(&self) -> &str {
        &self.current_topic
    }

    pub fn topic_description(&self) -> &str {
        &self.topic_description
    }

    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn toggle_panel(&mut self) {
        self.panel_visible = !self.panel_visible;
    }

    /// Shows `title` and `body` in the info panel for the configured duration.
    pub fn show_info_message(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.info = Some(InfoMessage {
            title: title.into(),
            body: body.into(),
            expires_at: self.now + Duration::from_millis(self.timings.info_message_ms),
        });
    }

    pub fn info_message(&self) -> Option<&InfoMessage> {
        self.info.as_ref()
    }

    pub fn set_tooltip(&mut self, tooltip: Option<Tooltip>) {
        self.tooltip = tooltip;
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.tooltip
    }

    pub fn active_nav(&self) -> NavTopic {
        self.active_nav
    }

    /// Switches the panel text to a navigation topic and asks for a view reset.
    pub fn navigate(&mut self, topic: NavTopic) {
        log::debug!("Navigating to {}", topic.label());
        self.active_nav = topic;
        self.current_topic = topic.label().to_string();
        self.topic_description = topic.description().to_string();
        self.pending.reset_view = true;
    }

    pub fn toggle_wireframe(&mut self) {
        self.wireframe = !self.wireframe;
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn toggle_animation(&mut self) {
        self.animation_active = !self.animation_active;
    }

    pub fn is_animation_active(&self) -> bool {
        self.animation_active
    }

    pub fn animation_button_label(&self) -> &'static str {
        if self.animation_active {
            "Pause Animation"
        } else {
            "Resume Animation"
        }
    }

    /// The instructions overlay goes away on the first lock and stays away.
    pub fn on_pointer_locked(&mut self) {
        self.instructions_visible = false;
    }

    pub fn instructions_visible(&self) -> bool {
        self.instructions_visible
    }

    pub fn set_renderer_ready(&mut self) {
        self.renderer_ready = true;
    }

    pub fn is_loading(&self) -> bool {
        !self.renderer_ready || self.now < self.loading_until
    }

    pub fn request_reset_view(&mut self) {
        self.pending.reset_view = true;
    }

    pub fn request_pointer_lock(&mut self) {
        self.pending.request_pointer_lock = true;
    }

    pub fn take_actions(&mut self) -> UiActions {
        std::mem::take(&mut self.pending)
    }

    /// Draws every UI layer for one frame.
    pub fn draw(&mut self, ctx: &egui::Context, scheme: ControlScheme, labels: &[StationLabel]) {
        if self.is_loading() {
            self.draw_loading(ctx);
            return;
        }

        self.draw_station_labels(ctx, labels);
        if self.panel_visible {
            self.draw_panel(ctx, scheme);
        }
        self.draw_info(ctx);
        self.draw_tooltip(ctx);

        if scheme == ControlScheme::FirstPerson {
            draw_crosshair(ctx);
            if self.instructions_visible {
                self.draw_instructions(ctx);
            }
        }
    }

    fn draw_loading(&self, ctx: &egui::Context) {
        let screen = ctx.screen_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("loading-screen"),
        ));
        painter.rect_filled(screen, 0.0, egui::Color32::from_rgb(0x1a, 0x1a, 0x2e));
        painter.text(
            screen.center(),
            egui::Align2::CENTER_CENTER,
            "Loading Computer Graphics Learning Studio...",
            egui::FontId::proportional(22.0),
            egui::Color32::WHITE,
        );
    }

    fn draw_panel(&mut self, ctx: &egui::Context, scheme: ControlScheme) {
        egui::SidePanel::right("ui-panel")
            .resizable(false)
            .exact_width(300.0)
            .show(ctx, |ui| {
                ui.push_id("current-topic", |ui| {
                    ui.heading(&self.current_topic);
                });
                ui.push_id("topic-description", |ui| {
                    ui.label(&self.topic_description);
                });
                ui.separator();

                let mut selected = None;
                ui.horizontal_wrapped(|ui| {
                    for topic in NavTopic::ALL {
                        let active = topic == self.active_nav;
                        let clicked = ui
                            .push_id(topic.id(), |ui| ui.selectable_label(active, topic.label()))
                            .inner
                            .clicked();
                        if clicked {
                            selected = Some(topic);
                        }
                    }
                });
                if let Some(topic) = selected {
                    self.navigate(topic);
                }
                ui.separator();

                if ui.push_id("reset-view", |ui| ui.button("Reset View")).inner.clicked() {
                    self.request_reset_view();
                }
                if ui
                    .push_id("toggle-wireframe", |ui| ui.button("Toggle Wireframe"))
                    .inner
                    .clicked()
                {
                    self.toggle_wireframe();
                }
                let label = self.animation_button_label();
                if ui.push_id("toggle-animation", |ui| ui.button(label)).inner.clicked() {
                    self.toggle_animation();
                }
                let switch = match scheme {
                    ControlScheme::Orbit => "Walk Around",
                    ControlScheme::FirstPerson => "Orbit View",
                };
                if ui.button(switch).clicked() {
                    self.pending.switch_scheme = true;
                }
            });
    }

    fn draw_info(&self, ctx: &egui::Context) {
        let Some(info) = &self.info else {
            return;
        };
        egui::Area::new(egui::Id::new("info-panel"))
            .anchor(egui::Align2::CENTER_TOP, [0.0, 20.0])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.heading(&info.title);
                    ui.label(&info.body);
                });
            });
    }

    fn draw_tooltip(&self, ctx: &egui::Context) {
        let Some(tooltip) = self.tooltip else {
            return;
        };
        let [x, y] = tooltip.position;
        egui::Area::new(egui::Id::new("tooltip"))
            .fixed_pos([x + 10.0, y + 10.0])
            .order(egui::Order::Tooltip)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(240.0);
                    ui.label(tooltip.text);
                });
            });
    }

    fn draw_instructions(&mut self, ctx: &egui::Context) {
        let clicked = egui::Area::new(egui::Id::new("instructions"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .order(egui::Order::Foreground)
            .sense(egui::Sense::click())
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.heading("Click to explore");
                    ui.label("WASD / arrows: move");
                    ui.label("Space: jump");
                    ui.label("Mouse: look around");
                    ui.label("Tab: toggle information panel");
                    ui.label("Esc: release the mouse");
                });
            })
            .response
            .clicked();
        if clicked {
            self.request_pointer_lock();
        }
    }

    fn draw_station_labels(&self, ctx: &egui::Context, labels: &[StationLabel]) {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("station-labels"),
        ));
        for label in labels {
            let [r, g, b] = label.color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
            painter.text(
                egui::pos2(label.position[0], label.position[1]),
                egui::Align2::CENTER_BOTTOM,
                label.text,
                egui::FontId::proportional(20.0),
                egui::Color32::from_rgb(r, g, b),
            );
        }
    }
}

fn draw_crosshair(ctx: &egui::Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("crosshair"),
    ));
    painter.circle_stroke(
        ctx.screen_rect().center(),
        5.0,
        egui::Stroke::new(1.0, egui::Color32::WHITE),
    );
}

impl StationDisplay for UiState {
    fn show_station(&mut self, name: &str, description: &str) {
        self.current_topic = name.to_string();
        self.topic_description = description.to_string();
        self.show_info_message(format!("Approaching: {name} Station"), "Press Tab to view details");
        self.panel_visible = true;
    }

    fn show_explore(&mut self) {
        self.current_topic = EXPLORE_TOPIC.to_string();
        self.topic_description = EXPLORE_DESCRIPTION.to_string();
    }
}
