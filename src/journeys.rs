use std::collections::BTreeSet;

/// A single historical-content unit (lesson) placed on the globe.
/// Identity is `id`; each module belongs to exactly one journey.
/// Modules with missing coordinates carry NaN and are excluded from
/// rendering by [`Module::has_valid_coordinates`].
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub journey_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub completed: bool,
    pub summary: Option<String>,
}

impl Module {
    /// Coordinate validity gate shared by filtering, rendering, and
    /// picking: finite and within [-90, 90] x [-180, 180].
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A named grouping of modules. Journeys are derived by grouping the
/// flat module list by `journey_id` at load time, preserving first-seen
/// order; they are not a stored entity of their own.
#[derive(Clone, Debug, PartialEq)]
pub struct Journey {
    pub id: String,
    pub title: String,
    pub modules: Vec<Module>,
}

/// The set of journey ids currently selected for rendering.
///
/// Transitions are immutable: every toggle produces a new set, so the
/// controller can diff old vs new to decide whether a rebuild of the
/// render set is needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    ids: BTreeSet<String>,
}

impl VisibilitySet {
    /// Empty set: nothing rendered.
    pub fn none() -> Self {
        Self::default()
    }

    /// All journeys visible — the state after every (re)load.
    pub fn all(journeys: &[Journey]) -> Self {
        Self {
            ids: journeys.iter().map(|j| j.id.clone()).collect(),
        }
    }

    pub fn contains(&self, journey_id: &str) -> bool {
        self.ids.contains(journey_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// New set with the given journey flipped in or out.
    pub fn toggled(&self, journey_id: &str) -> Self {
        let mut ids = self.ids.clone();
        if !ids.remove(journey_id) {
            ids.insert(journey_id.to_string());
        }
        Self { ids }
    }

    /// New set with every journey visible ("show all").
    pub fn with_all(&self, journeys: &[Journey]) -> Self {
        Self::all(journeys)
    }

    /// New empty set ("clear all").
    pub fn cleared(&self) -> Self {
        Self::none()
    }

    /// True when every journey in the list is visible — the boundary
    /// between the Ready and Filtered controller states.
    pub fn covers(&self, journeys: &[Journey]) -> bool {
        journeys.iter().all(|j| self.ids.contains(&j.id))
    }
}

/// Produce the subset of modules to render for the given visibility
/// set: modules of visible journeys whose coordinates pass validation,
/// in input journey order and input module order within a journey.
///
/// Pure and cheap enough to call on every visibility change — data
/// sets are tens to low hundreds of markers.
pub fn visible_modules<'a>(journeys: &'a [Journey], visible: &VisibilitySet) -> Vec<&'a Module> {
    journeys
        .iter()
        .filter(|j| visible.contains(&j.id))
        .flat_map(|j| j.modules.iter().filter(|m| m.has_valid_coordinates()))
        .collect()
}

#[cfg(test)]
pub(crate) fn test_module(id: &str, journey: &str, lat: f64, lng: f64) -> Module {
    Module {
        id: id.to_string(),
        title: id.to_string(),
        journey_id: journey.to_string(),
        latitude: lat,
        longitude: lng,
        completed: false,
        summary: None,
    }
}
