use crate::basemap::Basemap;
use crate::content::{spawn_fetch, ContentOrigin, ContentStats, FetchReply};
use crate::globe::{pick, GlobeCamera, Navigator};
use crate::journeys::{Journey, VisibilitySet};
use crate::render::RenderEntry;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Legend panel width in terminal columns.
pub const LEGEND_WIDTH: u16 = 28;

/// Controller lifecycle around the content fetch.
///
/// Loading -> Ready | Error on fetch completion; Ready <-> Filtered on
/// visibility toggles (Filtered = a proper subset visible); any state
/// -> Loading on explicit refresh. Error renders nothing and waits for
/// the user — there is no automatic retry.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Loading,
    Ready,
    Filtered,
    Error(String),
}

/// Owns the camera, the loaded journeys, the visibility set, and the
/// fetch lifecycle. The journey list is exclusively ours for the
/// duration of one mount; the visibility set has a single writer (the
/// user event handlers).
pub struct App {
    pub camera: GlobeCamera,
    pub basemap: Basemap,
    pub phase: Phase,
    pub journeys: Vec<Journey>,
    pub stats: ContentStats,
    pub origin: Option<ContentOrigin>,
    pub visible: VisibilitySet,
    pub should_quit: bool,
    pub show_diagnostics: bool,
    pub last_mouse: Option<(u16, u16)>,
    dragging: bool,
    render_set: Vec<RenderEntry>,
    dirty: bool,
    rebuilds: u64,
    navigator: Box<dyn Navigator>,
    fetch_tx: Sender<FetchReply>,
    fetch_rx: Receiver<FetchReply>,
    generation: u64,
    primary: PathBuf,
    snapshot: PathBuf,
}

impl App {
    pub fn new(
        term_width: usize,
        term_height: usize,
        primary: PathBuf,
        snapshot: PathBuf,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let (pixel_width, pixel_height) = globe_pixels(term_width, term_height);
        let (fetch_tx, fetch_rx) = channel();

        Self {
            camera: GlobeCamera::world(pixel_width, pixel_height),
            basemap: Basemap::new(),
            phase: Phase::Loading,
            journeys: Vec::new(),
            stats: ContentStats::default(),
            origin: None,
            visible: VisibilitySet::none(),
            should_quit: false,
            show_diagnostics: false,
            last_mouse: None,
            dragging: false,
            render_set: Vec::new(),
            dirty: false,
            rebuilds: 0,
            navigator,
            fetch_tx,
            fetch_rx,
            generation: 0,
            primary,
            snapshot,
        }
    }

    /// Start (or restart) the content fetch. Bumping the generation
    /// makes any in-flight reply stale; it will be discarded on
    /// arrival, so a refresh never races a previous fetch.
    pub fn request_refresh(&mut self) {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.journeys.clear();
        self.render_set.clear();
        self.stats = ContentStats::default();
        self.origin = None;
        self.visible = VisibilitySet::none();
        spawn_fetch(
            self.fetch_tx.clone(),
            self.generation,
            self.primary.clone(),
            self.snapshot.clone(),
        );
    }

    /// Drain completed fetches. Stale generations are dropped without
    /// touching the view.
    pub fn poll_fetch(&mut self) {
        while let Ok(reply) = self.fetch_rx.try_recv() {
            self.apply_reply(reply);
        }
    }

    fn apply_reply(&mut self, reply: FetchReply) {
        if reply.generation != self.generation {
            log::debug!(
                "discarding stale fetch reply (generation {} != {})",
                reply.generation,
                self.generation
            );
            return;
        }
        match reply.result {
            Ok(content) => {
                self.visible = VisibilitySet::all(&content.journeys);
                self.journeys = content.journeys;
                self.stats = content.stats;
                self.origin = Some(content.origin);
                self.phase = Phase::Ready;
                self.dirty = true;
            }
            Err(msg) => {
                // Render nothing rather than stale data without saying so
                self.journeys.clear();
                self.render_set.clear();
                self.stats = ContentStats::default();
                self.origin = None;
                self.phase = Phase::Error(msg);
                self.dirty = false;
            }
        }
    }

    fn accepts_toggles(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Filtered)
    }

    /// Flip one journey by its position in the legend (load order).
    pub fn toggle_journey(&mut self, index: usize) {
        if !self.accepts_toggles() {
            return;
        }
        if let Some(journey) = self.journeys.get(index) {
            self.visible = self.visible.toggled(&journey.id);
            self.dirty = true;
        }
    }

    /// "Show all" — every journey visible.
    pub fn show_all(&mut self) {
        if self.accepts_toggles() {
            self.visible = self.visible.with_all(&self.journeys);
            self.dirty = true;
        }
    }

    /// "Clear all" — nothing visible.
    pub fn clear_all(&mut self) {
        if self.accepts_toggles() {
            self.visible = self.visible.cleared();
            self.dirty = true;
        }
    }

    /// Apply pending visibility changes in one step. This is the only
    /// place the render set is rebuilt, so several toggles inside one
    /// event batch reach the screen as a single transition — no frame
    /// paints a half-updated marker set.
    pub fn commit(&mut self) {
        if !self.dirty {
            return;
        }
        self.render_set = self
            .journeys
            .iter()
            .enumerate()
            .filter(|(_, j)| self.visible.contains(&j.id))
            .flat_map(|(index, j)| {
                j.modules
                    .iter()
                    .filter(|m| m.has_valid_coordinates())
                    .map(move |m| RenderEntry { journey_index: index, module: m.clone() })
            })
            .collect();
        self.rebuilds += 1;
        self.dirty = false;

        if self.accepts_toggles() {
            self.phase = if self.visible.covers(&self.journeys) {
                Phase::Ready
            } else {
                Phase::Filtered
            };
        }
    }

    /// Markers to draw this frame, in journey order then module order.
    pub fn render_entries(&self) -> &[RenderEntry] {
        &self.render_set
    }

    /// How many times the render set has been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Hit-test a terminal cell against the rendered markers; on a hit,
    /// dispatch navigation to the lesson and return the module id.
    /// A miss is a no-op.
    pub fn pick_at(&mut self, col: u16, row: u16) -> Option<String> {
        if !self.accepts_toggles() {
            return None;
        }
        let (px, py) = cell_to_pixel(col, row);
        let modules: Vec<_> = self.render_set.iter().map(|e| &e.module).collect();
        let picked = pick(&self.camera, &modules, px, py)?;
        let id = picked.id.clone();
        self.navigator.open_lesson(&id);
        Some(id)
    }

    /// Update camera dimensions when the terminal resizes.
    pub fn resize(&mut self, term_width: usize, term_height: usize) {
        let (pw, ph) = globe_pixels(term_width, term_height);
        self.camera.set_size(pw, ph);
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragging = false;
    }

    /// Rotate the globe following the cursor.
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.camera.rotate_drag(dx, dy);
                self.dragging = true;
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse release: a press without movement is a pick.
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let was_drag = self.dragging;
        self.dragging = false;
        self.last_mouse = None;
        if !was_drag {
            self.pick_at(col, row);
        }
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.camera.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.camera.zoom_out_at(px, py);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Status-bar description of the view center.
    pub fn center_coords(&self) -> String {
        let (lat, lng) = self.camera.center();
        format!(
            "{:.1}°{} {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lng.abs(),
            if lng >= 0.0 { "E" } else { "W" },
        )
    }
}

/// Canvas pixel dimensions for the globe pane: terminal area minus the
/// legend column, the pane border, and the status bar, at Braille
/// resolution (2x4 dots per cell).
fn globe_pixels(term_width: usize, term_height: usize) -> (usize, usize) {
    let inner_width = term_width
        .saturating_sub(LEGEND_WIDTH as usize)
        .saturating_sub(2)
        .max(2);
    let inner_height = term_height.saturating_sub(3).max(1);
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to Braille pixel, accounting for the pane border.
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::LoadedContent;
    use crate::journeys::{test_module, Journey};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedNavigator(Arc<Mutex<Vec<String>>>);

    impl Navigator for SharedNavigator {
        fn open_lesson(&mut self, module_id: &str) {
            self.0.lock().unwrap().push(module_id.to_string());
        }
    }

    fn sample_journeys() -> Vec<Journey> {
        vec![
            Journey {
                id: "egypt".into(),
                title: "Ancient Egypt".into(),
                modules: vec![
                    test_module("giza", "egypt", 29.98, 31.13),
                    test_module("bad", "egypt", 999.0, 0.0),
                ],
            },
            Journey {
                id: "rome".into(),
                title: "Roman Empire".into(),
                modules: vec![test_module("forum", "rome", 41.89, 12.49)],
            },
        ]
    }

    fn ok_reply(generation: u64) -> FetchReply {
        let journeys = sample_journeys();
        let stats = ContentStats {
            journeys: journeys.len(),
            modules: 3,
            with_coordinates: 2,
        };
        FetchReply {
            generation,
            result: Ok(LoadedContent {
                journeys,
                stats,
                origin: ContentOrigin::Fresh,
            }),
        }
    }

    fn test_app() -> App {
        App::new(
            120,
            40,
            PathBuf::from("/nonexistent/modules.json"),
            PathBuf::from("/nonexistent/cache.json"),
            Box::new(SharedNavigator::default()),
        )
    }

    /// App with content applied, plus the navigator's recording handle.
    fn ready_app() -> (App, Arc<Mutex<Vec<String>>>) {
        let navigator = SharedNavigator::default();
        let opened = navigator.0.clone();
        let mut app = App::new(
            120,
            40,
            PathBuf::from("/nonexistent/modules.json"),
            PathBuf::from("/nonexistent/cache.json"),
            Box::new(navigator),
        );
        app.generation = 1;
        app.apply_reply(ok_reply(1));
        app.commit();
        (app, opened)
    }

    #[test]
    fn starts_in_loading() {
        let app = test_app();
        assert_eq!(app.phase, Phase::Loading);
        assert!(app.render_entries().is_empty());
    }

    #[test]
    fn successful_fetch_reaches_ready_with_all_visible() {
        let (app, _) = ready_app();
        assert_eq!(app.phase, Phase::Ready);
        assert_eq!(app.visible.len(), 2);
        // "bad" is dropped by coordinate validation
        let ids: Vec<&str> = app.render_entries().iter().map(|e| e.module.id.as_str()).collect();
        assert_eq!(ids, vec!["giza", "forum"]);
        assert_eq!(app.origin, Some(ContentOrigin::Fresh));
    }

    #[test]
    fn failed_fetch_reaches_error_and_renders_nothing() {
        let mut app = test_app();
        app.generation = 1;
        app.apply_reply(FetchReply { generation: 1, result: Err("boom".into()) });
        app.commit();
        assert_eq!(app.phase, Phase::Error("boom".into()));
        assert!(app.render_entries().is_empty());
        // Toggles are ignored in Error
        app.show_all();
        app.commit();
        assert_eq!(app.phase, Phase::Error("boom".into()));
    }

    #[test]
    fn refresh_after_error_goes_back_through_loading() {
        let mut app = test_app();
        app.generation = 1;
        app.apply_reply(FetchReply { generation: 1, result: Err("boom".into()) });
        app.request_refresh();
        assert_eq!(app.phase, Phase::Loading);
        // The new fetch (against the nonexistent path) may complete at
        // any time; its generation matches, so an error lands us in
        // Error again, which is the expected outcome here.
    }

    #[test]
    fn stale_fetch_reply_is_discarded() {
        let (mut app, _) = ready_app();
        let stale = FetchReply { generation: 0, result: Err("stale failure".into()) };
        app.apply_reply(stale);
        app.commit();
        // The stale error did not disturb the ready view
        assert_eq!(app.phase, Phase::Ready);
        assert_eq!(app.render_entries().len(), 2);
    }

    #[test]
    fn toggles_move_between_ready_and_filtered() {
        let (mut app, _) = ready_app();
        app.toggle_journey(1); // hide rome
        app.commit();
        assert_eq!(app.phase, Phase::Filtered);
        let ids: Vec<&str> = app.render_entries().iter().map(|e| e.module.id.as_str()).collect();
        assert_eq!(ids, vec!["giza"]);

        app.toggle_journey(1); // show rome again
        app.commit();
        assert_eq!(app.phase, Phase::Ready);
    }

    #[test]
    fn batched_toggles_rebuild_once_with_final_set() {
        let (mut app, _) = ready_app();
        let rebuilds_before = app.rebuild_count();

        // {egypt, rome} -> {egypt} -> {} inside one event tick
        app.toggle_journey(1);
        app.clear_all();
        assert_eq!(app.rebuild_count(), rebuilds_before, "no rebuild before commit");

        app.commit();
        assert_eq!(app.rebuild_count(), rebuilds_before + 1, "single atomic rebuild");
        assert!(app.render_entries().is_empty());
        assert_eq!(app.phase, Phase::Filtered);
    }

    #[test]
    fn commit_without_changes_is_a_no_op() {
        let (mut app, _) = ready_app();
        let rebuilds = app.rebuild_count();
        app.commit();
        assert_eq!(app.rebuild_count(), rebuilds);
    }

    #[test]
    fn show_all_after_clear_restores_everything() {
        let (mut app, _) = ready_app();
        app.clear_all();
        app.commit();
        assert!(app.render_entries().is_empty());
        app.show_all();
        app.commit();
        assert_eq!(app.render_entries().len(), 2);
        assert_eq!(app.phase, Phase::Ready);
    }

    #[test]
    fn pick_dispatches_navigation_for_marker_under_cursor() {
        let (mut app, opened) = ready_app();
        let (px, py) = app.camera.project(29.98, 31.13).expect("giza is front-facing");
        // Invert the border offset of cell_to_pixel
        let col = (px / 2 + 1) as u16;
        let row = (py / 4 + 1) as u16;

        let picked = app.pick_at(col, row);
        assert_eq!(picked.as_deref(), Some("giza"));
        assert_eq!(*opened.lock().unwrap(), vec!["giza".to_string()]);
    }

    #[test]
    fn pick_miss_dispatches_nothing() {
        let (mut app, opened) = ready_app();
        assert!(app.pick_at(1, 1).is_none());
        assert!(opened.lock().unwrap().is_empty());
    }

    #[test]
    fn pick_is_ignored_while_loading() {
        let mut app = test_app();
        assert!(app.pick_at(30, 10).is_none());
    }

    #[test]
    fn real_fetch_round_trip_through_channel() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("modules.json");
        std::fs::write(
            &primary,
            r#"[{"id":"giza","title":"Giza","journey_id":"egypt",
                "latitude":29.98,"longitude":31.13}]"#,
        )
        .unwrap();

        let mut app = App::new(
            120,
            40,
            primary,
            dir.path().join("cache.json"),
            Box::new(SharedNavigator::default()),
        );
        app.request_refresh();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while app.phase == Phase::Loading && std::time::Instant::now() < deadline {
            app.poll_fetch();
            app.commit();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(app.phase, Phase::Ready);
        assert_eq!(app.render_entries().len(), 1);
    }
}
