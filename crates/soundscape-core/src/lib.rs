//! Composition data model and data pipeline, free of any ML framework.
//!
//! Everything the learned composer needs short of tensors: packs and their
//! source vocabularies, the fixed-shape slot encoding, augmentation and
//! splitting, the generation output contract, quality heuristics and the
//! rule-based fallback.
//!
//! ```rust,ignore
//! use soundscape_core::{EncodedComposition, Pack, SourceVocabulary};
//!
//! let vocab = SourceVocabulary::for_pack(Pack::Adventure);
//! let encoded = EncodedComposition::encode(&composition, &vocab, 20);
//! ```

mod error;
pub use error::{Error, Result};

mod pack;
pub use pack::Pack;

mod composition;
pub use composition::{
    Arrangement, Composition, PlacedSource, Scene, CANVAS_HEIGHT, CANVAS_WIDTH, NUM_SCENES,
};

mod vocabulary;
pub use vocabulary::{pack_source_names, SourceVocabulary, Token};

mod encode;
pub use encode::{
    denormalize_position, encode_all, normalize_position, EncodedComposition, EncodedSlot,
    DEFAULT_MAX_SOURCES_PER_SCENE,
};

pub mod augment;

mod output;
pub use output::{
    GeneratedComposition, DEFAULT_AMBIENCE_VOLUME, DEFAULT_MASTER_VOLUME, DEFAULT_MUSIC_VOLUME,
    RULE_BASED_VERSION,
};

mod fallback;
pub use fallback::{FallbackGenerator, RuleBasedGenerator};

pub mod metrics;

mod source;
pub use source::{CompositionSource, InMemorySource};
