//! Per-pack source vocabularies.
//!
//! A [`SourceVocabulary`] maps source identifiers (`adv-hero`) to dense token
//! indices. Two reserved tokens sit on top of the real ones:
//!
//! - PAD = `num_sources`, one past the last real index.
//! - START = `num_sources - 1`, which shares its index with the last real
//!   source. Trained checkpoints depend on this layout, so [`Token::index`]
//!   keeps it even though the enum keeps the roles apart.

use crate::error::{Error, Result};
use crate::pack::Pack;
use std::collections::HashMap;

const ADVENTURE_MUSIC: [&str; 16] = [
    "hero", "drums", "flute", "strings", "harp", "trumpet", "bass", "choir", "lute", "horn",
    "bells", "fiddle", "pan_flute", "tambourine", "dulcimer", "bagpipe",
];

const ADVENTURE_AMBIENCE: [&str; 16] = [
    "birds", "wind", "grass", "water", "leaves", "insects", "stream", "owl", "frog", "cricket",
    "breeze", "rustle", "chirp", "flutter", "whisper", "echo",
];

const COMBAT_MUSIC: [&str; 16] = [
    "warrior", "war_drums", "horn", "heavy_bass", "battle_cry", "anvil", "clash", "march",
    "warcry", "thunderdrum", "battlehorn", "armory", "siege", "charge", "rally", "conquest",
];

const COMBAT_AMBIENCE: [&str; 16] = [
    "sword_clash", "fire", "monster", "thunder", "roar", "flames", "rumble", "growl", "crackle",
    "stomp", "boom", "sizzle", "smash", "crash", "bang", "explosion",
];

const SHELTER_MUSIC: [&str; 16] = [
    "melody", "piano", "harp", "pad", "warmth", "comfort", "peace", "calm", "gentle", "soft",
    "lullaby", "cradle", "rest", "ease", "serene", "tranquil",
];

const SHELTER_AMBIENCE: [&str; 16] = [
    "fireplace", "rain", "night", "wood_creak", "wind_chime", "clock", "settle", "ember",
    "drizzle", "patter", "tick", "glow", "warm", "cozy", "quiet", "still",
];

/// Music and ambience source names of a pack, without the pack prefix.
pub fn pack_source_names(pack: Pack) -> (&'static [&'static str], &'static [&'static str]) {
    match pack {
        Pack::Adventure => (&ADVENTURE_MUSIC, &ADVENTURE_AMBIENCE),
        Pack::Combat => (&COMBAT_MUSIC, &COMBAT_AMBIENCE),
        Pack::Shelter => (&SHELTER_MUSIC, &SHELTER_AMBIENCE),
    }
}

/// A token in the model's input alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Source(usize),
    Pad,
    Start,
}

impl Token {
    /// Integer index in a vocabulary of `num_sources` real entries.
    pub fn index(self, num_sources: usize) -> usize {
        match self {
            Token::Source(i) => i,
            Token::Pad => num_sources,
            Token::Start => num_sources.saturating_sub(1),
        }
    }
}

/// Bidirectional `name <-> index` mapping for one pack.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVocabulary {
    pack: Pack,
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl SourceVocabulary {
    /// Build the default vocabulary: music sources first, then ambience.
    pub fn for_pack(pack: Pack) -> Self {
        let (music, ambience) = pack_source_names(pack);
        let names = music
            .iter()
            .chain(ambience.iter())
            .map(|name| format!("{}-{}", pack.prefix(), name))
            .collect::<Vec<_>>();
        let indices = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            pack,
            names,
            indices,
        }
    }

    /// Rebuild a vocabulary from a stored mapping (index = position).
    pub fn from_mapping(pack: Pack, names: Vec<String>) -> Result<Self> {
        if names.len() < 2 {
            return Err(Error::InvalidVocabulary(format!(
                "{} needs at least 2 sources, mapping has {}",
                pack,
                names.len()
            )));
        }

        let mut indices = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if indices.insert(name.clone(), i).is_some() {
                return Err(Error::InvalidVocabulary(format!(
                    "duplicate source '{}' in {} mapping",
                    name, pack
                )));
            }
        }

        Ok(Self {
            pack,
            names,
            indices,
        })
    }

    pub fn pack(&self) -> Pack {
        self.pack
    }

    /// Number of real sources.
    pub fn num_sources(&self) -> usize {
        self.names.len()
    }

    /// Rows needed in an embedding table (real sources + PAD).
    pub fn embedding_size(&self) -> usize {
        self.names.len() + 1
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn token_index(&self, token: Token) -> usize {
        token.index(self.num_sources())
    }

    pub fn pad_index(&self) -> usize {
        self.token_index(Token::Pad)
    }

    pub fn start_index(&self) -> usize {
        self.token_index(Token::Start)
    }

    /// Ordered names, suitable for storing next to trained weights.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        for pack in Pack::ALL {
            let vocab = SourceVocabulary::for_pack(pack);
            assert_eq!(vocab.num_sources(), 32);
            assert_eq!(vocab.embedding_size(), 33);
        }
    }

    #[test]
    fn test_bijection() {
        let vocab = SourceVocabulary::for_pack(Pack::Combat);
        for i in 0..vocab.num_sources() {
            let name = vocab.name(i).unwrap();
            assert!(name.starts_with("cmb-"));
            assert_eq!(vocab.index(name), Some(i));
        }
        assert_eq!(vocab.index("cmb-warrior"), Some(0));
        assert_eq!(vocab.index("cmb-sword_clash"), Some(16));
        assert_eq!(vocab.index("adv-hero"), None);
        assert_eq!(vocab.name(32), None);
    }

    #[test]
    fn test_reserved_tokens() {
        let vocab = SourceVocabulary::for_pack(Pack::Shelter);
        assert_eq!(vocab.pad_index(), 32);
        assert_eq!(vocab.start_index(), 31);
        assert_eq!(vocab.token_index(Token::Source(31)), vocab.start_index());
    }

    #[test]
    fn test_from_mapping() {
        let vocab = SourceVocabulary::for_pack(Pack::Adventure);
        let rebuilt = SourceVocabulary::from_mapping(Pack::Adventure, vocab.names().to_vec()).unwrap();
        assert_eq!(rebuilt, vocab);

        let custom = SourceVocabulary::from_mapping(
            Pack::Adventure,
            vec!["x".into(), "y".into(), "z".into()],
        )
        .unwrap();
        assert_eq!(custom.pad_index(), 3);
        assert_eq!(custom.index("z"), Some(2));
    }

    #[test]
    fn test_from_mapping_rejects_duplicates() {
        let result = SourceVocabulary::from_mapping(Pack::Adventure, vec!["a".into(), "a".into()]);
        assert!(matches!(result, Err(Error::InvalidVocabulary(_))));
    }
}
