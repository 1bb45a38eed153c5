//! Composition data model shared with the persistence and API layers.
//!
//! Field names follow the JSON contract (`placedSources`, `sourceId`), so these
//! types deserialize directly from stored documents.

use crate::error::{Error, Result};
use crate::pack::Pack;
use serde::{Deserialize, Serialize};

/// Canvas width in pixels.
pub const CANVAS_WIDTH: f64 = 1000.0;

/// Canvas height in pixels.
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Every composition has exactly this many scenes.
pub const NUM_SCENES: usize = 16;

fn default_x() -> f64 {
    CANVAS_WIDTH / 2.0
}

fn default_y() -> f64 {
    CANVAS_HEIGHT / 2.0
}

fn default_volume() -> f64 {
    1.0
}

/// One sound asset instance placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSource {
    pub id: String,
    pub source_id: String,
    #[serde(default = "default_x")]
    pub x: f64,
    #[serde(default = "default_y")]
    pub y: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub muted: bool,
}

impl PlacedSource {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, x: f64, y: f64, volume: f64) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            x,
            y,
            volume,
            muted: false,
        }
    }

    /// True when position and volume lie inside the canvas / unit range.
    pub fn in_bounds(&self) -> bool {
        (0.0..=CANVAS_WIDTH).contains(&self.x)
            && (0.0..=CANVAS_HEIGHT).contains(&self.y)
            && (0.0..=1.0).contains(&self.volume)
    }
}

/// One of the 16 scene slots of a composition.
///
/// The id is signed so that malformed stored records still deserialize; the
/// tensor pipeline skips scenes whose id falls outside `0..16`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: i32,
    #[serde(default)]
    pub placed_sources: Vec<PlacedSource>,
}

impl Scene {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            placed_sources: Vec::new(),
        }
    }

    pub fn with_sources(id: i32, placed_sources: Vec<PlacedSource>) -> Self {
        Self { id, placed_sources }
    }

    /// Scene index if the id is in range.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.id).ok().filter(|&i| i < NUM_SCENES)
    }
}

/// Anything laid out as a list of scenes.
pub trait Arrangement {
    fn scenes(&self) -> &[Scene];

    fn placed_sources(&self) -> impl Iterator<Item = &PlacedSource> {
        self.scenes().iter().flat_map(|s| s.placed_sources.iter())
    }
}

/// A user-authored (or generated) multi-scene composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub pack: Pack,
    pub scenes: Vec<Scene>,
}

impl Composition {
    /// Composition with 16 empty scenes.
    pub fn empty(pack: Pack) -> Self {
        Self {
            pack,
            scenes: (0..NUM_SCENES as i32).map(Scene::new).collect(),
        }
    }

    /// Check the 16-scene invariant: ids cover `0..16` exactly once.
    pub fn validate(&self) -> Result<()> {
        if self.scenes.len() != NUM_SCENES {
            return Err(Error::InvalidComposition(format!(
                "expected {} scenes, found {}",
                NUM_SCENES,
                self.scenes.len()
            )));
        }

        let mut seen = [false; NUM_SCENES];
        for scene in &self.scenes {
            let index = scene.index().ok_or_else(|| {
                Error::InvalidComposition(format!("scene id {} out of range", scene.id))
            })?;
            if seen[index] {
                return Err(Error::InvalidComposition(format!(
                    "duplicate scene id {}",
                    scene.id
                )));
            }
            seen[index] = true;
        }
        Ok(())
    }

    pub fn source_count(&self) -> usize {
        self.placed_sources().count()
    }
}

impl Arrangement for Composition {
    fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}
