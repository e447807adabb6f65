//! Streaming track decoder
//!
//! Advanced once per step (1/16th of a beat). A note with duration `d`
//! sounds for `d + 1` steps: the step that decodes it, then `d` holding
//! steps.

use super::{
    TrackInfo, DURATION_REPEAT, DURATION_WIDE, IMMEDIATE_PAUSE_OFFSET, SHORT_PAUSE_OFFSET,
    TRACK_END,
};
use crate::tone::Note;

/// Result of advancing a track by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new note (or pause, as [`Note::NONE`]) starts on this step
    Play(Note),
    /// The current note keeps sounding
    Hold,
    /// The track has no more notes
    End,
}

/// Playback cursor over one validated track
#[derive(Debug, Clone)]
pub struct TrackDecoder {
    body: &'static [u8],
    immediate_pause: u8,
    pos: usize,
    note: Note,
    duration_left: u16,
    duration_total: u16,
    duration_repeat: u8,
    pending_pause: bool,
    finished: bool,
}

impl TrackDecoder {
    /// Position a decoder at the start of a track
    pub fn new(track: &TrackInfo) -> Self {
        TrackDecoder {
            body: track.body,
            immediate_pause: track.immediate_pause,
            pos: 0,
            note: Note::NONE,
            duration_left: 0,
            duration_total: 0,
            duration_repeat: 0,
            pending_pause: false,
            finished: false,
        }
    }

    /// Note currently sounding ([`Note::NONE`] during pauses)
    pub fn note(&self) -> Note {
        self.note
    }

    /// Whether the end of track was reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by one step
    pub fn step(&mut self) -> StepOutcome {
        if self.finished {
            return StepOutcome::End;
        }
        if self.duration_left > 0 {
            self.duration_left -= 1;
            return StepOutcome::Hold;
        }

        if self.pending_pause {
            self.pending_pause = false;
            self.note = Note::NONE;
            self.duration_left = self.immediate_pause as u16;
            return StepOutcome::Play(self.note);
        }

        let byte = self.next_byte();
        if byte == TRACK_END {
            self.finished = true;
            self.note = Note::NONE;
            return StepOutcome::End;
        }

        if byte >= SHORT_PAUSE_OFFSET {
            // does not count as a previous duration
            self.duration_left = (byte - SHORT_PAUSE_OFFSET) as u16;
            self.note = Note::NONE;
            return StepOutcome::Play(self.note);
        }

        if self.duration_repeat > 0 {
            self.duration_repeat -= 1;
        } else {
            let duration = self.next_byte();
            if duration >= DURATION_WIDE {
                let low = self.next_byte();
                self.duration_total = u16::from_be_bytes([duration & 0x3f, low]);
            } else if duration >= DURATION_REPEAT {
                self.duration_repeat = duration - DURATION_REPEAT;
            } else {
                self.duration_total = duration as u16;
            }
        }
        self.duration_left = self.duration_total;

        let raw = if byte >= IMMEDIATE_PAUSE_OFFSET {
            self.pending_pause = true;
            byte - IMMEDIATE_PAUSE_OFFSET
        } else {
            byte
        };
        self.note = Note::from_raw(raw);
        StepOutcome::Play(self.note)
    }

    fn next_byte(&mut self) -> u8 {
        // validated bodies always end in TRACK_END before running out
        let byte = self.body.get(self.pos).copied().unwrap_or(TRACK_END);
        self.pos += 1;
        byte
    }
}
