//! Sound Bank
//!
//! Read-only storage of sound assets addressed by small integer ids. On the
//! console this is a table in flash; on the host a map of static byte
//! slices.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::track::SoundData;
use crate::{AudioError, Result};

/// Identifier of a sound asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u16);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of validated sound assets
pub trait SoundBank {
    /// Look up an asset
    fn sound(&self, id: SoundId) -> Option<SoundData>;

    /// Look up an asset, failing with [`AudioError::UnknownSound`]
    fn resolve(&self, id: SoundId) -> Result<SoundData> {
        self.sound(id).ok_or(AudioError::UnknownSound(id))
    }
}

/// In-memory bank of `'static` assets, validated on insertion
#[derive(Debug, Clone, Default)]
pub struct StaticSoundBank {
    sounds: BTreeMap<SoundId, SoundData>,
}

impl StaticSoundBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add an asset, replacing any previous one with the same id
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidSound`] if `data` is malformed.
    pub fn insert(&mut self, id: SoundId, data: &'static [u8]) -> Result<()> {
        let sound = SoundData::parse(data)?;
        self.sounds.insert(id, sound);
        Ok(())
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether the bank holds no asset
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Asset ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = SoundId> + '_ {
        self.sounds.keys().copied()
    }
}

impl SoundBank for StaticSoundBank {
    fn sound(&self, id: SoundId) -> Option<SoundData> {
        self.sounds.get(&id).copied()
    }
}
