use glam::DVec3;

/// Convert (lat, lng) in degrees to a Cartesian point on a sphere of
/// the given radius. Returns `None` for non-finite or out-of-range
/// input — callers exclude the record rather than crash.
///
/// Axis convention, fixed crate-wide and shared by the camera, marker
/// placement, and picking:
///   x = cos(lat)·cos(lng), y = cos(lat)·sin(lng), z = sin(lat)
pub fn sphere_point(lat: f64, lng: f64, radius: f64) -> Option<DVec3> {
    if !lat.is_finite() || !lng.is_finite() || !radius.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }
    Some(unit_vector(lat, lng) * radius)
}

/// Inverse of [`sphere_point`]: recover (lat, lng) in degrees from a
/// Cartesian point. The point need not be exactly on the unit sphere;
/// only its direction matters.
pub fn sphere_to_lat_lng(p: DVec3) -> (f64, f64) {
    let n = p.normalize();
    let lat = n.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lng = n.y.atan2(n.x).to_degrees();
    (lat, lng)
}

/// Unit-sphere direction for valid (lat, lng). Callers validate first.
#[inline(always)]
fn unit_vector(lat: f64, lng: f64) -> DVec3 {
    let lat_rad = lat.to_radians();
    let lng_rad = lng.to_radians();
    DVec3::new(
        lat_rad.cos() * lng_rad.cos(),
        lat_rad.cos() * lng_rad.sin(),
        lat_rad.sin(),
    )
}

/// Orthographic camera over the unit sphere. Orientation is stored as
/// an orthonormal frame (forward/right/up) so point transforms are
/// three dot products, no quaternion needed.
#[derive(Clone)]
pub struct GlobeCamera {
    /// Direction from sphere center toward the viewer.
    forward: DVec3,
    /// Points east on screen.
    right: DVec3,
    /// Points north on screen.
    up: DVec3,
    /// Sphere radius in canvas pixels (controls zoom).
    pub radius: f64,
    /// Canvas pixel width.
    pub width: usize,
    /// Canvas pixel height.
    pub height: usize,
}

impl GlobeCamera {
    /// Camera centered on (lat, lng) with the given pixel radius.
    pub fn new(center_lat: f64, center_lng: f64, radius: f64, width: usize, height: usize) -> Self {
        let lat_rad = center_lat.to_radians();
        let lng_rad = center_lng.to_radians();

        let forward = unit_vector(center_lat, center_lng);

        // Derivative of forward w.r.t. latitude: points north
        let raw_up = DVec3::new(
            -lat_rad.sin() * lng_rad.cos(),
            -lat_rad.sin() * lng_rad.sin(),
            lat_rad.cos(),
        );

        let right = raw_up.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        Self { forward, right, up, radius, width, height }
    }

    /// World view: whole visible hemisphere fits the canvas.
    pub fn world(width: usize, height: usize) -> Self {
        let radius = (width.min(height * 2) as f64 * 0.42).max(1.0);
        Self::new(20.0, 0.0, radius, width, height)
    }

    /// Project (lat, lng) to canvas pixels together with view depth
    /// (dot with forward, in [0, 1] for front-facing points). Returns
    /// `None` for invalid coordinates or back-face points.
    pub fn project_with_depth(&self, lat: f64, lng: f64) -> Option<(i32, i32, f64)> {
        let p = sphere_point(lat, lng, 1.0)?;

        let depth = p.dot(self.forward);
        if depth < 0.0 {
            return None;
        }

        let sx = p.dot(self.right);
        let sy = p.dot(self.up);

        let px = (self.width as f64 / 2.0 + sx * self.radius) as i32;
        let py = (self.height as f64 / 2.0 - sy * self.radius) as i32;

        Some((px, py, depth))
    }

    /// Project (lat, lng) to canvas pixels; `None` off the visible
    /// hemisphere.
    pub fn project(&self, lat: f64, lng: f64) -> Option<(i32, i32)> {
        self.project_with_depth(lat, lng).map(|(px, py, _)| (px, py))
    }

    /// Unproject canvas pixels back to (lat, lng). `None` outside the
    /// sphere disk.
    pub fn unproject(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        let sx = (px as f64 - self.width as f64 / 2.0) / self.radius;
        let sy = -(py as f64 - self.height as f64 / 2.0) / self.radius;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }

        let sz = (1.0 - r2).sqrt();
        let p = self.right * sx + self.up * sy + self.forward * sz;
        Some(sphere_to_lat_lng(p))
    }

    /// Center of view as (lat, lng).
    pub fn center(&self) -> (f64, f64) {
        sphere_to_lat_lng(self.forward)
    }

    /// Rotate by a pixel drag delta so the surface follows the cursor.
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        let angle_x = (dx as f64) / self.radius;
        let angle_y = -(dy as f64) / self.radius;
        self.rotate(angle_x, angle_y);
    }

    /// Rotate by angles (radians) around the up and right axes.
    fn rotate(&mut self, angle_x: f64, angle_y: f64) {
        if angle_x.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_x.sin_cos();
            let new_forward = self.forward * cos_a + self.right * sin_a;
            let new_right = self.right * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.right = new_right.normalize();
        }
        if angle_y.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_y.sin_cos();
            let new_forward = self.forward * cos_a + self.up * sin_a;
            let new_up = self.up * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.up = new_up.normalize();
        }
    }

    fn min_radius(&self) -> f64 {
        (self.width as f64 * 0.35).max(1.0)
    }

    fn max_radius(&self) -> f64 {
        self.width as f64 * 35.0
    }

    /// Zoom in by scaling the sphere radius.
    pub fn zoom_in(&mut self) {
        self.radius = (self.radius * 1.5).min(self.max_radius());
    }

    /// Zoom out by scaling the sphere radius.
    pub fn zoom_out(&mut self) {
        self.radius = (self.radius / 1.5).max(self.min_radius());
    }

    /// Zoom in towards a pixel, keeping the surface point under the
    /// cursor fixed.
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a pixel.
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let target = self.unproject(px, py);

        let (min_r, max_r) = (self.min_radius(), self.max_radius());
        self.radius = (self.radius * factor).clamp(min_r, max_r);

        // Small corrective rotation so the same geo point stays under
        // the cursor after the radius change
        if let Some((lat, lng)) = target {
            if let Some(target_vec) = sphere_point(lat, lng, 1.0) {
                let sx_now = target_vec.dot(self.right);
                let sy_now = target_vec.dot(self.up);
                let sx_want = (px as f64 - self.width as f64 / 2.0) / self.radius;
                let sy_want = -(py as f64 - self.height as f64 / 2.0) / self.radius;
                self.rotate(sx_now - sx_want, sy_want - sy_now);
            }
        }
    }

    /// Zoom level normalized so the world view is 1.0. Drives basemap
    /// LOD selection and label visibility.
    pub fn effective_zoom(&self) -> f64 {
        self.radius / self.min_radius()
    }

    /// Update canvas dimensions on terminal resize.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.radius = self.radius.clamp(self.min_radius(), self.max_radius());
    }

    /// Whether a projected pixel lands in (or just off) the canvas.
    pub fn is_on_canvas(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }
}

/// Walk a great-circle arc between two valid geographic points,
/// invoking the visitor for each subdivision point (endpoint included,
/// start excluded). Segments are split to roughly 2° so coastlines
/// curve smoothly instead of cutting chords across the sphere.
pub fn walk_great_circle(
    lat0: f64,
    lng0: f64,
    lat1: f64,
    lng1: f64,
    mut visitor: impl FnMut(f64, f64),
) {
    let (Some(a), Some(b)) = (sphere_point(lat0, lng0, 1.0), sphere_point(lat1, lng1, 1.0)) else {
        return;
    };

    let dot = a.dot(b).clamp(-1.0, 1.0);
    let angle = dot.acos();

    let steps = ((angle.to_degrees() / 2.0).ceil() as usize).max(1);
    let sin_angle = angle.sin();
    if steps == 1 || sin_angle.abs() < 1e-10 {
        visitor(lat1, lng1);
        return;
    }

    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        let (lat, lng) = sphere_to_lat_lng(a * sa + b * sb);
        visitor(lat, lng);
    }
}
