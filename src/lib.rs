//! Globe visualization for Historia's geographic lesson content.
//!
//! Modules ("lessons") carry coordinates and group into journeys; the
//! crate projects them onto an orthographic globe, filters them by a
//! journey visibility set, hit-tests pointer picks against rendered
//! markers, and manages the fetch lifecycle around the content source.

pub mod app;
pub mod basemap;
pub mod braille;
pub mod content;
pub mod geometry;
pub mod globe;
pub mod journeys;
pub mod render;
pub mod ui;
