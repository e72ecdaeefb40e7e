use crate::globe::projection::GlobeCamera;
use crate::journeys::Module;
use std::process::Command;

/// Hit-test tolerance around a projected marker, in canvas pixels.
pub const PICK_RADIUS_PX: i32 = 6;

/// Hit-test a pointer position against the rendered marker set.
///
/// Markers are projected through the same camera used for drawing, so
/// picking and rendering cannot drift apart. Back-face and
/// invalid-coordinate modules never match. On overlapping candidates
/// the marker nearest to the camera wins; ties break toward the
/// smallest screen-space distance to the pointer. A miss returns
/// `None` and is not an error.
pub fn pick<'a>(camera: &GlobeCamera, modules: &[&'a Module], px: i32, py: i32) -> Option<&'a Module> {
    let tol2 = (PICK_RADIUS_PX * PICK_RADIUS_PX) as i64;

    let mut best: Option<(&'a Module, f64, i64)> = None;

    for module in modules {
        let Some((mx, my, depth)) = camera.project_with_depth(module.latitude, module.longitude)
        else {
            continue;
        };

        let dx = (mx - px) as i64;
        let dy = (my - py) as i64;
        let dist2 = dx * dx + dy * dy;
        if dist2 > tol2 {
            continue;
        }

        let closer = match best {
            None => true,
            Some((_, best_depth, best_dist2)) => {
                depth > best_depth || (depth == best_depth && dist2 < best_dist2)
            }
        };
        if closer {
            best = Some((module, depth, dist2));
        }
    }

    best.map(|(module, _, _)| module)
}

/// Navigation collaborator: asked to open the lesson view for a picked
/// module. Fire-and-forget, no return value consumed.
pub trait Navigator {
    fn open_lesson(&mut self, module_id: &str);
}

/// Production navigator: hard navigation to the lesson route in the
/// platform browser via the system URL opener. Spawn failures are
/// logged and otherwise ignored.
pub struct LessonOpener {
    base_url: String,
}

impl LessonOpener {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Route base from `HISTORIA_BASE_URL`, with the hosted default.
    pub fn from_env() -> Self {
        let base = std::env::var("HISTORIA_BASE_URL")
            .unwrap_or_else(|_| "https://historia.app".to_string());
        Self::new(base)
    }

    fn opener_command() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

impl Navigator for LessonOpener {
    fn open_lesson(&mut self, module_id: &str) {
        let url = format!("{}/lesson/{}", self.base_url.trim_end_matches('/'), module_id);
        log::info!("opening lesson route {url}");
        if let Err(e) = Command::new(Self::opener_command()).arg(&url).spawn() {
            log::warn!("failed to launch opener for {url}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journeys::test_module;

    /// Records dispatched lesson ids instead of navigating.
    #[derive(Default)]
    pub struct RecordingNavigator {
        pub opened: Vec<String>,
    }

    impl Navigator for RecordingNavigator {
        fn open_lesson(&mut self, module_id: &str) {
            self.opened.push(module_id.to_string());
        }
    }

    fn camera() -> GlobeCamera {
        GlobeCamera::new(0.0, 0.0, 100.0, 400, 400)
    }

    #[test]
    fn pick_hits_marker_under_pointer() {
        let cam = camera();
        let m = test_module("giza", "egypt", 10.0, 20.0);
        let modules = vec![&m];
        let (px, py) = cam.project(10.0, 20.0).unwrap();

        let hit = pick(&cam, &modules, px, py);
        assert_eq!(hit.map(|m| m.id.as_str()), Some("giza"));

        // Within tolerance still hits
        let hit = pick(&cam, &modules, px + PICK_RADIUS_PX, py);
        assert_eq!(hit.map(|m| m.id.as_str()), Some("giza"));
    }

    #[test]
    fn pick_miss_is_none() {
        let cam = camera();
        let m = test_module("giza", "egypt", 10.0, 20.0);
        let modules = vec![&m];
        let (px, py) = cam.project(10.0, 20.0).unwrap();

        assert!(pick(&cam, &modules, px + PICK_RADIUS_PX * 3, py).is_none());
        assert!(pick(&cam, &[], px, py).is_none());
    }

    #[test]
    fn overlapping_markers_resolve_to_nearest_camera_then_pointer() {
        let cam = camera();
        // Same screen neighborhood, different view depth: the one
        // closer to the view center has higher depth
        let near = test_module("near", "j", 1.0, 1.0);
        let far = test_module("far", "j", 1.0, 4.0);
        let modules = vec![&far, &near];

        let (px, py) = cam.project(1.0, 2.0).unwrap();
        let hit = pick(&cam, &modules, px, py).expect("overlap never yields null");
        assert_eq!(hit.id, "near");
    }

    #[test]
    fn identical_position_ties_break_by_pointer_distance() {
        let cam = camera();
        let a = test_module("a", "j", 5.0, 5.0);
        let b = test_module("b", "j", 5.0, 5.0);
        let modules = vec![&a, &b];
        let (px, py) = cam.project(5.0, 5.0).unwrap();

        // Exactly one marker is returned, never both
        let hit = pick(&cam, &modules, px, py).unwrap();
        assert_eq!(hit.id, "a");
    }

    #[test]
    fn back_face_markers_never_pick() {
        let cam = camera();
        let hidden = test_module("hidden", "j", 0.0, 179.0);
        let modules = vec![&hidden];
        assert!(pick(&cam, &modules, 200, 200).is_none());
    }

    #[test]
    fn recording_navigator_captures_dispatch() {
        let mut nav = RecordingNavigator::default();
        nav.open_lesson("m-1");
        nav.open_lesson("m-2");
        assert_eq!(nav.opened, vec!["m-1", "m-2"]);
    }
}
