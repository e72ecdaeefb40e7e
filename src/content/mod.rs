mod fetch;

pub use fetch::{spawn_fetch, FetchReply};

use crate::journeys::{Journey, Module};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One row of the "modules" collection as the content service returns
/// it. The whole collection is fetched and grouped locally; there is
/// no server-side filtering contract.
#[derive(Debug, Deserialize)]
pub struct ModuleRow {
    pub id: String,
    pub title: String,
    pub journey_id: String,
    #[serde(default)]
    pub journey_title: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Whether the content came from the authoritative source or from the
/// local snapshot after the source failed. Callers can tell stale data
/// apart instead of treating both identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentOrigin {
    Fresh,
    CacheFallback,
}

/// Load diagnostics: not load-bearing, but the support story for "why
/// is my marker missing" starts with these counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub journeys: usize,
    pub modules: usize,
    pub with_coordinates: usize,
}

impl ContentStats {
    pub fn dropped(&self) -> usize {
        self.modules - self.with_coordinates
    }
}

/// Result of one successful content load.
#[derive(Debug)]
pub struct LoadedContent {
    pub journeys: Vec<Journey>,
    pub stats: ContentStats,
    pub origin: ContentOrigin,
}

/// Parse a modules document and group rows into journeys, preserving
/// first-seen journey order and row order within each journey. Rows
/// with missing coordinates are kept (NaN-flagged) so journey module
/// counts stay truthful; rendering drops them downstream.
pub fn parse_modules(bytes: &mut [u8]) -> Result<(Vec<Journey>, ContentStats)> {
    let rows: Vec<ModuleRow> =
        simd_json::serde::from_slice(bytes).context("malformed modules document")?;

    let mut journeys: Vec<Journey> = Vec::new();
    let mut stats = ContentStats::default();

    for row in rows {
        let module = Module {
            latitude: row.latitude.unwrap_or(f64::NAN),
            longitude: row.longitude.unwrap_or(f64::NAN),
            id: row.id,
            title: row.title,
            journey_id: row.journey_id.clone(),
            completed: row.completed,
            summary: row.summary,
        };

        stats.modules += 1;
        if module.has_valid_coordinates() {
            stats.with_coordinates += 1;
        }

        match journeys.iter_mut().find(|j| j.id == row.journey_id) {
            Some(journey) => journey.modules.push(module),
            None => journeys.push(Journey {
                title: row.journey_title.unwrap_or_else(|| row.journey_id.clone()),
                id: row.journey_id,
                modules: vec![module],
            }),
        }
    }

    stats.journeys = journeys.len();
    Ok((journeys, stats))
}

/// Load content from the primary source, falling back to the local
/// snapshot when the source is unavailable. A fresh load refreshes the
/// snapshot (best effort). Both failing is a fetch failure for the
/// caller to surface.
pub fn load_content(primary: &Path, snapshot: &Path) -> Result<LoadedContent> {
    match fs::read(primary) {
        Ok(mut bytes) => {
            let (journeys, stats) = parse_modules(&mut bytes)
                .with_context(|| format!("parsing {}", primary.display()))?;
            log_stats(&stats, ContentOrigin::Fresh);
            if let Err(e) = write_snapshot(snapshot, primary) {
                log::warn!("could not refresh snapshot {}: {e}", snapshot.display());
            }
            Ok(LoadedContent { journeys, stats, origin: ContentOrigin::Fresh })
        }
        Err(primary_err) => {
            log::warn!(
                "content source {} unavailable ({primary_err}), trying snapshot",
                primary.display()
            );
            let mut bytes = fs::read(snapshot).with_context(|| {
                format!(
                    "content source {} unavailable and no snapshot at {}",
                    primary.display(),
                    snapshot.display()
                )
            })?;
            let (journeys, stats) = parse_modules(&mut bytes)
                .with_context(|| format!("parsing snapshot {}", snapshot.display()))?;
            log_stats(&stats, ContentOrigin::CacheFallback);
            Ok(LoadedContent { journeys, stats, origin: ContentOrigin::CacheFallback })
        }
    }
}

fn write_snapshot(snapshot: &Path, primary: &Path) -> std::io::Result<()> {
    if snapshot == primary {
        return Ok(());
    }
    if let Some(parent) = snapshot.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(primary, snapshot).map(|_| ())
}

fn log_stats(stats: &ContentStats, origin: ContentOrigin) {
    log::info!(
        "loaded {} journeys, {} modules ({} with coordinates, {} dropped) [{origin:?}]",
        stats.journeys,
        stats.modules,
        stats.with_coordinates,
        stats.dropped(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"[
        {"id":"giza","title":"The Great Pyramid","journey_id":"egypt",
         "journey_title":"Ancient Egypt","latitude":29.98,"longitude":31.13},
        {"id":"forum","title":"The Roman Forum","journey_id":"rome",
         "journey_title":"Roman Empire","latitude":41.89,"longitude":12.49,
         "completed":true},
        {"id":"rosetta","title":"The Rosetta Stone","journey_id":"egypt",
         "latitude":31.40,"longitude":30.42,"summary":"Key to hieroglyphs"},
        {"id":"lost","title":"No Coordinates","journey_id":"rome"}
    ]"#;

    #[test]
    fn groups_rows_into_journeys_preserving_order() {
        let mut bytes = DOC.as_bytes().to_vec();
        let (journeys, stats) = parse_modules(&mut bytes).unwrap();

        assert_eq!(journeys.len(), 2);
        assert_eq!(journeys[0].id, "egypt");
        assert_eq!(journeys[0].title, "Ancient Egypt");
        assert_eq!(journeys[1].id, "rome");

        let egypt_ids: Vec<&str> =
            journeys[0].modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(egypt_ids, vec!["giza", "rosetta"]);

        assert_eq!(stats.journeys, 2);
        assert_eq!(stats.modules, 4);
        assert_eq!(stats.with_coordinates, 3);
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn journey_title_defaults_to_id() {
        let mut bytes =
            br#"[{"id":"a","title":"A","journey_id":"silk-road","latitude":1,"longitude":2}]"#
                .to_vec();
        let (journeys, _) = parse_modules(&mut bytes).unwrap();
        assert_eq!(journeys[0].title, "silk-road");
    }

    #[test]
    fn completion_flag_survives_parsing() {
        let mut bytes = DOC.as_bytes().to_vec();
        let (journeys, _) = parse_modules(&mut bytes).unwrap();
        let forum = &journeys[1].modules[0];
        assert!(forum.completed);
        assert!(!journeys[0].modules[0].completed);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let mut bytes = b"not json".to_vec();
        assert!(parse_modules(&mut bytes).is_err());
    }

    #[test]
    fn fresh_load_refreshes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("modules.json");
        let snapshot = dir.path().join("cache/modules.json");
        fs::write(&primary, DOC).unwrap();

        let loaded = load_content(&primary, &snapshot).unwrap();
        assert_eq!(loaded.origin, ContentOrigin::Fresh);
        assert_eq!(loaded.journeys.len(), 2);
        assert!(snapshot.exists(), "snapshot refreshed after fresh load");
    }

    #[test]
    fn missing_source_falls_back_to_snapshot_tagged_stale() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("modules.json");
        let snapshot = dir.path().join("cache/modules.json");
        fs::create_dir_all(snapshot.parent().unwrap()).unwrap();
        fs::write(&snapshot, DOC).unwrap();

        let loaded = load_content(&primary, &snapshot).unwrap();
        assert_eq!(loaded.origin, ContentOrigin::CacheFallback);
        assert_eq!(loaded.stats.modules, 4);
    }

    #[test]
    fn missing_source_and_snapshot_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("modules.json");
        let snapshot = dir.path().join("cache/modules.json");
        assert!(load_content(&primary, &snapshot).is_err());
    }
}
