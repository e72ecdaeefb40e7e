mod picking;
mod projection;

pub use picking::{pick, LessonOpener, Navigator, PICK_RADIUS_PX};
pub use projection::{sphere_point, sphere_to_lat_lng, walk_great_circle, GlobeCamera};
