//! Generation output contract consumed by the persistence layer.

use crate::composition::{Arrangement, Composition, Scene};
use crate::error::{Error, Result};
use crate::pack::Pack;
use serde::{Deserialize, Serialize};

/// `model_version` of compositions produced without a trained model.
pub const RULE_BASED_VERSION: &str = "rule-based-v1.0";

pub const DEFAULT_MASTER_VOLUME: f64 = 1.0;
pub const DEFAULT_MUSIC_VOLUME: f64 = 1.0;
pub const DEFAULT_AMBIENCE_VOLUME: f64 = 0.7;

/// A complete generated composition with mixer levels and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedComposition {
    pub pack: Pack,
    pub scenes: Vec<Scene>,
    pub master_volume: f64,
    pub music_volume: f64,
    pub ambience_volume: f64,
    #[serde(rename = "model_version")]
    pub model_version: String,
}

impl GeneratedComposition {
    /// Wrap scenes with the default mixer levels.
    pub fn new(pack: Pack, scenes: Vec<Scene>, model_version: impl Into<String>) -> Self {
        Self {
            pack,
            scenes,
            master_volume: DEFAULT_MASTER_VOLUME,
            music_volume: DEFAULT_MUSIC_VOLUME,
            ambience_volume: DEFAULT_AMBIENCE_VOLUME,
            model_version: model_version.into(),
        }
    }

    pub fn is_rule_based(&self) -> bool {
        self.model_version == RULE_BASED_VERSION
    }

    /// Scene structure plus canvas/volume bounds of every placed source.
    pub fn validate(&self) -> Result<()> {
        self.to_composition().validate()?;
        if let Some(source) = self.placed_sources().find(|s| !s.in_bounds()) {
            return Err(Error::InvalidComposition(format!(
                "source {} out of bounds (x={}, y={}, volume={})",
                source.id, source.x, source.y, source.volume
            )));
        }
        Ok(())
    }

    pub fn to_composition(&self) -> Composition {
        Composition {
            pack: self.pack,
            scenes: self.scenes.clone(),
        }
    }
}

impl Arrangement for GeneratedComposition {
    fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}
