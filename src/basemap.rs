use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// A geographic polyline as (lat, lng) pairs.
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for coastline data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD from the camera's normalized zoom (1.0 = world view).
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Reference coastlines behind the content markers. Not part of the
/// content model — purely geographic context for the globe.
pub struct Basemap {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
}

impl Basemap {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
        }
    }

    /// Load every available Natural Earth coastline file from the data
    /// directory, one resolution per LOD, in parallel. Missing or
    /// unreadable files are logged and skipped; with nothing loaded the
    /// caller falls back to [`Basemap::builtin`].
    pub fn load(data_dir: &Path) -> Self {
        let files = [
            ("ne_110m_coastline.json", Lod::Low),
            ("ne_50m_coastline.json", Lod::Medium),
            ("ne_10m_coastline.json", Lod::High),
        ];

        let loaded: Vec<(Lod, Vec<LineString>)> = files
            .par_iter()
            .filter_map(|(name, lod)| {
                let path = data_dir.join(name);
                if !path.exists() {
                    return None;
                }
                match load_coastline_file(&path) {
                    Ok(lines) => {
                        log::info!("basemap {name}: {} coastline segments", lines.len());
                        Some((*lod, lines))
                    }
                    Err(e) => {
                        log::warn!("basemap {name} skipped: {e:#}");
                        None
                    }
                }
            })
            .collect();

        let mut basemap = Self::new();
        for (lod, lines) in loaded {
            match lod {
                Lod::Low => basemap.coastlines_low = lines,
                Lod::Medium => basemap.coastlines_medium = lines,
                Lod::High => basemap.coastlines_high = lines,
            }
        }
        basemap
    }

    /// Coarse built-in continent outlines, used when no coastline data
    /// is on disk so the globe is never a bare disk.
    pub fn builtin() -> Self {
        let mut basemap = Self::new();
        basemap.coastlines_low = builtin_outlines();
        basemap
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    /// Coastlines for the given LOD, falling back to the best coarser
    /// resolution that is actually loaded.
    pub fn coastlines(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.coastlines_high.is_empty() => &self.coastlines_high,
            Lod::High | Lod::Medium if !self.coastlines_medium.is_empty() => {
                &self.coastlines_medium
            }
            _ => &self.coastlines_low,
        }
    }
}

impl Default for Basemap {
    fn default() -> Self {
        Self::new()
    }
}

fn load_coastline_file(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    let mut lines = Vec::new();
    collect_lines(&geojson, &mut lines);
    Ok(lines)
}

/// Extract every line feature from a GeoJSON document as (lat, lng)
/// polylines. GeoJSON positions are [lng, lat]; the swap happens here
/// and nowhere else.
pub fn collect_lines(geojson: &GeoJson, out: &mut Vec<LineString>) {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    collect_geometry_lines(geometry, out);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                collect_geometry_lines(geometry, out);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry_lines(geometry, out),
    }
}

fn collect_geometry_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    let to_latlng = |coords: &[Vec<f64>]| -> LineString {
        coords.iter().map(|c| (c[1], c[0])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => out.push(to_latlng(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                out.push(to_latlng(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                out.push(to_latlng(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    out.push(to_latlng(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Hand-traced rough outlines of the major landmasses, (lat, lng).
fn builtin_outlines() -> Vec<LineString> {
    vec![
        // North America
        vec![
            (65.0, -168.0), (60.0, -141.0), (48.0, -125.0), (32.0, -117.0),
            (25.0, -110.0), (25.0, -97.0), (24.0, -82.0), (31.0, -81.0),
            (41.0, -70.0), (47.0, -65.0), (47.0, -52.0), (55.0, -58.0),
            (62.0, -73.0), (62.0, -95.0), (70.0, -130.0), (70.0, -145.0),
            (65.0, -168.0),
        ],
        // South America
        vec![
            (10.0, -80.0), (5.0, -60.0), (0.0, -50.0), (-5.0, -35.0),
            (-15.0, -38.0), (-25.0, -48.0), (-38.0, -58.0), (-50.0, -68.0),
            (-52.0, -75.0), (-40.0, -72.0), (-20.0, -70.0), (-5.0, -80.0),
            (10.0, -80.0),
        ],
        // Europe
        vec![
            (36.0, -10.0), (38.0, 0.0), (43.0, 5.0), (45.0, 15.0),
            (37.0, 25.0), (42.0, 35.0), (55.0, 40.0), (65.0, 25.0),
            (71.0, 10.0), (58.0, 5.0), (52.0, -10.0), (43.0, -5.0),
            (36.0, -10.0),
        ],
        // Africa
        vec![
            (35.0, -5.0), (33.0, 10.0), (30.0, 32.0), (12.0, 43.0),
            (-5.0, 40.0), (-25.0, 35.0), (-35.0, 20.0), (-30.0, 15.0),
            (-15.0, 10.0), (5.0, 5.0), (5.0, -10.0), (15.0, -17.0),
            (28.0, -15.0), (35.0, -5.0),
        ],
        // Asia
        vec![
            (42.0, 35.0), (25.0, 60.0), (8.0, 77.0), (22.0, 90.0),
            (10.0, 105.0), (22.0, 115.0), (30.0, 122.0), (40.0, 140.0),
            (52.0, 143.0), (60.0, 160.0), (66.0, 180.0), (70.0, 130.0),
            (75.0, 100.0), (70.0, 70.0), (68.0, 45.0), (55.0, 40.0),
            (42.0, 35.0),
        ],
        // Australia
        vec![
            (-12.0, 130.0), (-12.0, 142.0), (-25.0, 153.0), (-38.0, 147.0),
            (-35.0, 137.0), (-32.0, 125.0), (-35.0, 115.0), (-22.0, 114.0),
            (-12.0, 130.0),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_linestrings_with_latlng_order() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.0, 50.0], [11.0, 51.0]]
                }
            }]
        }"#;
        let geojson: GeoJson = doc.parse().unwrap();
        let mut lines = Vec::new();
        collect_lines(&geojson, &mut lines);
        assert_eq!(lines, vec![vec![(50.0, 10.0), (51.0, 11.0)]]);
    }

    #[test]
    fn multipolygon_keeps_exterior_rings_only() {
        let doc = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
                 [[0.2, 0.2], [0.8, 0.2], [0.8, 0.8], [0.2, 0.2]]]
            ]
        }"#;
        let geojson: GeoJson = doc.parse().unwrap();
        let mut lines = Vec::new();
        collect_lines(&geojson, &mut lines);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4);
    }

    #[test]
    fn lod_selection_by_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(3.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(12.0), Lod::High);
    }

    #[test]
    fn lod_falls_back_to_loaded_resolution() {
        let mut basemap = Basemap::new();
        basemap.coastlines_low = builtin_outlines();
        assert!(!basemap.coastlines(Lod::High).is_empty());
        assert!(std::ptr::eq(
            basemap.coastlines(Lod::High).as_ptr(),
            basemap.coastlines_low.as_ptr()
        ));
    }

    #[test]
    fn builtin_outlines_have_valid_coordinates() {
        for line in builtin_outlines() {
            for (lat, lng) in line {
                assert!((-90.0..=90.0).contains(&lat));
                assert!((-180.0..=180.0).contains(&lng));
            }
        }
    }
}
