use crate::basemap::{Basemap, Lod};
use crate::braille::BrailleCanvas;
use crate::geometry::{draw_disk_outline, draw_line};
use crate::globe::{walk_great_circle, GlobeCamera};
use crate::journeys::Module;

/// Zoom threshold above which marker titles are drawn next to glyphs.
const LABEL_ZOOM: f64 = 2.5;

/// One module of the render set together with the index of its journey
/// in load order (drives the legend color palette).
#[derive(Clone, Debug)]
pub struct RenderEntry {
    pub journey_index: usize,
    pub module: Module,
}

/// A marker resolved to a character cell, ready for the UI overlay.
pub struct MarkerGlyph {
    pub cell_x: u16,
    pub cell_y: u16,
    pub journey_index: usize,
    pub completed: bool,
    pub label: Option<String>,
}

/// Output of one frame: the Braille base layer (horizon + coastlines)
/// plus marker glyphs to overlay in journey colors.
pub struct FrameLayers {
    pub base: BrailleCanvas,
    pub markers: Vec<MarkerGlyph>,
}

/// Project the basemap and the filtered render set through the camera.
/// Pure with respect to the inputs; called once per paint.
pub fn render_frame(basemap: &Basemap, camera: &GlobeCamera, entries: &[RenderEntry]) -> FrameLayers {
    let mut base = BrailleCanvas::new(camera.width.div_ceil(2), camera.height.div_ceil(4));

    draw_disk_outline(
        &mut base,
        camera.width as i32 / 2,
        camera.height as i32 / 2,
        camera.radius,
    );

    let lod = Lod::from_zoom(camera.effective_zoom());
    for line in basemap.coastlines(lod) {
        draw_polyline(&mut base, camera, line);
    }

    let show_labels = camera.effective_zoom() >= LABEL_ZOOM;
    let mut markers = Vec::with_capacity(entries.len());
    for entry in entries {
        let m = &entry.module;
        let Some((px, py)) = camera.project(m.latitude, m.longitude) else {
            continue;
        };
        if !camera.is_on_canvas(px, py) || px < 0 || py < 0 {
            continue;
        }
        markers.push(MarkerGlyph {
            cell_x: (px / 2) as u16,
            cell_y: (py / 4) as u16,
            journey_index: entry.journey_index,
            completed: m.completed,
            label: show_labels.then(|| m.title.clone()),
        });
    }

    FrameLayers { base, markers }
}

/// Draw one coastline through the camera, subdividing along great
/// circles so sparse outlines curve with the sphere instead of cutting
/// chords. Segments leaving the visible hemisphere are skipped.
fn draw_polyline(canvas: &mut BrailleCanvas, camera: &GlobeCamera, line: &[(f64, f64)]) {
    if line.len() < 2 {
        return;
    }

    let mut prev_geo: Option<(f64, f64)> = None;
    let mut prev_px: Option<(i32, i32)> = None;

    for &(lat, lng) in line {
        match prev_geo {
            None => prev_px = camera.project(lat, lng),
            Some((plat, plng)) => {
                walk_great_circle(plat, plng, lat, lng, |wlat, wlng| {
                    let cur = camera.project(wlat, wlng);
                    if let (Some((x0, y0)), Some((x1, y1))) = (prev_px, cur) {
                        let span = ((x1 - x0).abs() + (y1 - y0).abs()) as usize;
                        if span < camera.width
                            && (camera.is_on_canvas(x0, y0) || camera.is_on_canvas(x1, y1))
                        {
                            draw_line(canvas, x0, y0, x1, y1);
                        }
                    }
                    prev_px = cur;
                });
            }
        }
        prev_geo = Some((lat, lng));
    }
}
