//! Training data sources.

use crate::composition::Composition;
use crate::error::Result;
use crate::pack::Pack;
use std::collections::HashMap;
use std::future::Future;

/// Supplies user-authored compositions for training.
///
/// Implementations talk to the persistence layer; training awaits
/// [`load_user_compositions`](Self::load_user_compositions) once per run.
pub trait CompositionSource: Send + Sync {
    /// All non-generated compositions of `pack`.
    fn load_user_compositions(
        &self,
        pack: Pack,
    ) -> impl Future<Output = Result<Vec<Composition>>> + Send;
}

/// In-process source backed by a map, for tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    compositions: HashMap<Pack, Vec<Composition>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `compositions` by their pack.
    pub fn from_compositions(compositions: impl IntoIterator<Item = Composition>) -> Self {
        let mut source = Self::new();
        for composition in compositions {
            source.insert(composition);
        }
        source
    }

    pub fn insert(&mut self, composition: Composition) {
        self.compositions
            .entry(composition.pack)
            .or_default()
            .push(composition);
    }

    pub fn len(&self, pack: Pack) -> usize {
        self.compositions.get(&pack).map_or(0, Vec::len)
    }
}

impl CompositionSource for InMemorySource {
    async fn load_user_compositions(&self, pack: Pack) -> Result<Vec<Composition>> {
        Ok(self.compositions.get(&pack).cloned().unwrap_or_default())
    }
}
