//! Sound Asset Format
//!
//! A sound asset holds up to one track per tone channel:
//!
//! ```text
//! [0xf2]                                  optional signature
//! <track>*                                ascending channel order
//! 0xff                                    end of asset
//!
//! track  = channel len_lo len_hi immediate_pause body
//! body   = (note duration? | short_pause)* 0xff
//! ```
//!
//! Track length is little endian and includes the four header bytes.
//!
//! | note byte     | meaning                                            |
//! |---------------|----------------------------------------------------|
//! | `0x00..=0x53` | note (C2 upward), followed by a duration            |
//! | `0x54`        | pause, followed by a duration                       |
//! | `0x55..=0xa9` | same as above, then the track's immediate pause     |
//! | `0xaa..=0xfe` | pause of `byte - 0xaa` extra steps, no duration     |
//! | `0xff`        | end of track                                       |
//!
//! | duration byte | meaning                                            |
//! |---------------|----------------------------------------------------|
//! | `0x00..=0x7f` | `byte + 1` steps                                   |
//! | `0x80..=0xbf` | previous duration, for this note and the `byte - 0x80` next ones (no duration byte) |
//! | `0xc0..=0xff` | two bytes, `((b0 & 0x3f) << 8 | b1) + 1` steps     |
//!
//! Assets are validated once by [`SoundData::parse`]; the [`TrackDecoder`]
//! then runs without bounds surprises on the hot path.

mod decoder;

pub use decoder::{StepOutcome, TrackDecoder};

use crate::channel::{Channel, ChannelMask, CHANNEL_COUNT};
use crate::tone::Note;
use crate::{AudioError, Result};

/// Optional first byte of a sound asset
pub const SIGNATURE: u8 = 0xf2;
/// End-of-track and end-of-asset marker
pub const TRACK_END: u8 = 0xff;
/// Size of a track header in bytes
pub const TRACK_HEADER_SIZE: usize = 4;

pub(crate) const PAUSE: u8 = 0x54;
pub(crate) const IMMEDIATE_PAUSE_OFFSET: u8 = 0x55;
pub(crate) const SHORT_PAUSE_OFFSET: u8 = 0xaa;

pub(crate) const DURATION_REPEAT: u8 = 0x80;
pub(crate) const DURATION_WIDE: u8 = 0xc0;

/// One channel's track inside a sound asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    /// Channel the track plays on
    pub channel: Channel,
    /// Extra steps of the pause appended after "note + immediate pause" bytes
    pub immediate_pause: u8,
    /// Interleaved note/duration stream, ending with [`TRACK_END`]
    pub body: &'static [u8],
}

/// A validated sound asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundData {
    tracks: [Option<TrackInfo>; CHANNEL_COUNT],
}

impl SoundData {
    /// Validate an asset and index its tracks
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidSound`] on any structural problem:
    /// truncated data, channels out of order, bad lengths, notes outside the
    /// note table, or missing end markers.
    pub fn parse(data: &'static [u8]) -> Result<Self> {
        let mut pos = match data.first() {
            Some(&SIGNATURE) => 1,
            Some(_) => 0,
            None => return Err(invalid("empty sound data")),
        };

        let mut tracks = [None; CHANNEL_COUNT];
        let mut next_channel = 0u8;
        loop {
            let channel_byte = *data
                .get(pos)
                .ok_or_else(|| invalid(format!("missing end marker at offset {pos}")))?;
            if channel_byte == TRACK_END {
                break;
            }

            let channel = Channel::from_index(channel_byte)
                .ok_or_else(|| invalid(format!("bad channel {channel_byte} at offset {pos}")))?;
            if channel_byte < next_channel {
                return Err(invalid(format!(
                    "track for channel {channel_byte} out of order at offset {pos}"
                )));
            }
            next_channel = channel_byte + 1;

            let header = data
                .get(pos..pos + TRACK_HEADER_SIZE)
                .ok_or_else(|| invalid(format!("truncated track header at offset {pos}")))?;
            let length = u16::from_le_bytes([header[1], header[2]]) as usize;
            let immediate_pause = header[3];
            if length <= TRACK_HEADER_SIZE {
                return Err(invalid(format!("track length {length} too short")));
            }
            let body = data
                .get(pos + TRACK_HEADER_SIZE..pos + length)
                .ok_or_else(|| invalid(format!("track at offset {pos} exceeds sound data")))?;
            validate_body(body).map_err(|msg| invalid(format!("channel {channel_byte}: {msg}")))?;

            tracks[channel.index()] = Some(TrackInfo {
                channel,
                immediate_pause,
                body,
            });
            pos += length;
        }

        if pos + 1 != data.len() {
            return Err(invalid(format!(
                "{} trailing bytes after end marker",
                data.len() - pos - 1
            )));
        }
        Ok(SoundData { tracks })
    }

    /// Track for a channel, if the asset has one
    pub fn track(&self, channel: Channel) -> Option<&TrackInfo> {
        self.tracks[channel.index()].as_ref()
    }

    /// Channels this asset has tracks for
    pub fn channels(&self) -> ChannelMask {
        Channel::ALL
            .into_iter()
            .filter(|&ch| self.track(ch).is_some())
            .fold(ChannelMask::empty(), |mask, ch| mask | ch.mask())
    }

    /// Iterate over present tracks in channel order
    pub fn tracks(&self) -> impl Iterator<Item = &TrackInfo> {
        self.tracks.iter().flatten()
    }
}

fn invalid(msg: impl Into<String>) -> AudioError {
    AudioError::InvalidSound(msg.into())
}

/// Walk a track body the same way the decoder will, checking every read
fn validate_body(body: &[u8]) -> std::result::Result<(), String> {
    let mut pos = 0;
    let mut repeat = 0u8;
    loop {
        let byte = *body.get(pos).ok_or("missing end of track")?;
        pos += 1;
        if byte == TRACK_END {
            // anything after the end marker is never read
            return Ok(());
        }
        if byte >= SHORT_PAUSE_OFFSET {
            continue;
        }

        let note = if byte >= IMMEDIATE_PAUSE_OFFSET {
            byte - IMMEDIATE_PAUSE_OFFSET
        } else {
            byte
        };
        if note != PAUSE && Note::new(note).is_none() {
            return Err(format!("note {note:#04x} at offset {} out of range", pos - 1));
        }

        if repeat > 0 {
            repeat -= 1;
            continue;
        }
        let duration = *body
            .get(pos)
            .ok_or_else(|| format!("missing duration at offset {pos}"))?;
        if duration >= DURATION_WIDE {
            body.get(pos + 1)
                .ok_or_else(|| format!("truncated duration at offset {pos}"))?;
            pos += 2;
        } else {
            if duration >= DURATION_REPEAT {
                repeat = duration - DURATION_REPEAT;
            }
            pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-track reference asset (channels 1 and 2)
    pub(crate) static REFERENCE: [u8; 42] = [
        0x01, 0x05, 0x00, 0x00, 0xff, 0x02, 0x24, 0x00, 0x04, 0x18, 0x3f, 0x19, //
        0xc1, 0xf3, 0x24, 0x07, 0x25, 0x83, 0x26, 0x27, 0x28, 0x29, 0x82, 0x30, //
        0x31, 0x6d, 0x0f, 0x6e, 0x80, 0x54, 0xc0, 0x83, 0xa9, 0x7e, 0xc0, 0x18, //
        0x18, 0xff, 0xff, 0x00, 0xff, 0xff,
    ];

    #[test]
    fn test_parse_reference_asset() {
        let sound = SoundData::parse(&REFERENCE).unwrap();
        assert_eq!(sound.channels(), ChannelMask::CH1 | ChannelMask::CH2);
        assert!(sound.track(Channel::Ch0).is_none());

        let first = sound.track(Channel::Ch1).unwrap();
        assert_eq!(first.body, &[0xff]);

        let second = sound.track(Channel::Ch2).unwrap();
        assert_eq!(second.immediate_pause, 4);
        assert_eq!(second.body.len(), 0x24 - TRACK_HEADER_SIZE);
    }

    #[test]
    fn test_parse_with_signature() {
        static DATA: [u8; 7] = [SIGNATURE, 0x00, 0x06, 0x00, 0x00, 0xaa, 0xff];
        // length 6 leaves no room for the final marker
        assert!(SoundData::parse(&DATA).is_err());

        static FIXED: [u8; 8] = [SIGNATURE, 0x00, 0x06, 0x00, 0x00, 0xaa, 0xff, 0xff];
        let sound = SoundData::parse(&FIXED).unwrap();
        assert_eq!(sound.channels(), ChannelMask::CH0);
    }

    #[test]
    fn test_empty_asset() {
        static DATA: [u8; 1] = [0xff];
        let sound = SoundData::parse(&DATA).unwrap();
        assert!(sound.channels().is_empty());
        assert!(SoundData::parse(&[]).is_err());
    }

    #[test]
    fn test_rejects_channels_out_of_order() {
        static DATA: [u8; 11] = [
            0x01, 0x05, 0x00, 0x00, 0xff, 0x00, 0x05, 0x00, 0x00, 0xff, 0xff,
        ];
        let err = SoundData::parse(&DATA).unwrap_err();
        assert!(matches!(err, AudioError::InvalidSound(_)));
    }

    #[test]
    fn test_rejects_bad_channel() {
        static DATA: [u8; 6] = [0x03, 0x05, 0x00, 0x00, 0xff, 0xff];
        assert!(SoundData::parse(&DATA).is_err());
    }

    #[test]
    fn test_rejects_length_past_end() {
        static DATA: [u8; 6] = [0x00, 0x20, 0x00, 0x00, 0xff, 0xff];
        assert!(SoundData::parse(&DATA).is_err());
    }

    #[test]
    fn test_rejects_note_out_of_range() {
        // 0x49 is one past the highest note
        static DATA: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x49, 0x00, 0xff, 0xff];
        assert!(SoundData::parse(&DATA).is_err());

        static OK: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x48, 0x00, 0xff, 0xff];
        assert!(SoundData::parse(&OK).is_ok());
    }

    #[test]
    fn test_rejects_missing_duration() {
        static DATA: [u8; 6] = [0x00, 0x05, 0x00, 0x00, 0x10, 0xff];
        assert!(SoundData::parse(&DATA).is_err());
    }

    #[test]
    fn test_rejects_missing_track_end() {
        static DATA: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x10, 0x00, 0xaa, 0xff];
        assert!(SoundData::parse(&DATA).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        static DATA: [u8; 7] = [0x00, 0x05, 0x00, 0x00, 0xff, 0xff, 0x00];
        assert!(SoundData::parse(&DATA).is_err());
    }
}
