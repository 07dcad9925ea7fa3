// In-memory Standard MIDI File model and its serializer.
//
// A `MidiFile` owns an ordered list of `Track`s; each track is an ordered
// list of note-on/note-off events whose delta-times count ticks since the
// previous event on the same track. Serialization goes through the field
// encoders in encode.rs:
//
//   "MThd" u32(6) u16(format) u16(track count) u16(ticks per quarter)
//   per track: "MTrk" u32(body length) { VLQ delta, status, key, velocity }*
//
// A track's body length precedes its events, so it is summed from
// `var_len_byte_count` plus each event's fixed payload in a first pass.
//
// Appends validate before touching the model: a bad track index, channel,
// velocity or delta-time returns an error and leaves every track unchanged. `add_chord`
// checks all three target tracks up front for the same reason.

use crate::chord::{Chord, Note};
use crate::encode::{VAR_LEN_MAX, var_len_byte_count, write_u16_be, write_u32_be, write_var_len};
use crate::error::MidiError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

const HEADER_MAGIC: &[u8; 4] = b"MThd";
const TRACK_MAGIC: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;

/// Default resolution, chosen so a 4/4 bar is 512 ticks.
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 128;

/// SMF format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    SingleTrack,
    MultiTrackSync,
    MultiTrackAsync,
}

impl Format {
    pub fn tag(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::MultiTrackSync => 1,
            Format::MultiTrackAsync => 2,
        }
    }
}

/// Velocities and channel applied to a note or chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Articulation {
    pub velocity: u8,
    pub release_velocity: u8,
    pub channel: u8,
}

impl Default for Articulation {
    fn default() -> Self {
        Articulation {
            velocity: 96,
            release_velocity: 64,
            channel: 0,
        }
    }
}

/// A single channel-voice event on a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    NoteOn {
        delta: u32,
        channel: u8,
        note: Note,
        velocity: u8,
    },
    NoteOff {
        delta: u32,
        channel: u8,
        note: Note,
        velocity: u8,
    },
}

impl TrackEvent {
    /// Bytes after the delta-time: status, key, velocity.
    pub fn payload_len(&self) -> usize {
        match self {
            TrackEvent::NoteOn { .. } | TrackEvent::NoteOff { .. } => 3,
        }
    }

    pub fn delta(&self) -> u32 {
        match *self {
            TrackEvent::NoteOn { delta, .. } | TrackEvent::NoteOff { delta, .. } => delta,
        }
    }

    /// Delta-time plus payload, as written.
    pub fn encoded_len(&self) -> usize {
        var_len_byte_count(self.delta()) + self.payload_len()
    }

    fn status(&self) -> u8 {
        match *self {
            TrackEvent::NoteOn { channel, .. } => 0x90 | channel,
            TrackEvent::NoteOff { channel, .. } => 0x80 | channel,
        }
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), MidiError> {
        let (note, velocity) = match *self {
            TrackEvent::NoteOn { note, velocity, .. }
            | TrackEvent::NoteOff { note, velocity, .. } => (note, velocity),
        };
        write_var_len(writer, i64::from(self.delta()))?;
        writer.write_all(&[self.status(), note.key(), velocity])?;
        Ok(())
    }
}

/// An ordered event list. Owned by its `MidiFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Length of the track body in bytes, as written in the track header.
    pub fn body_len(&self) -> usize {
        self.events.iter().map(TrackEvent::encoded_len).sum()
    }

    /// Total ticks spanned by the track.
    #[cfg(test)]
    pub(crate) fn duration_ticks(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.delta())).sum()
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), MidiError> {
        let body_len = self.body_len();
        let body_len = u32::try_from(body_len).map_err(|_| MidiError::TrackTooLong(body_len))?;
        writer.write_all(TRACK_MAGIC)?;
        write_u32_be(writer, body_len)?;
        for event in &self.events {
            event.write(writer)?;
        }
        Ok(())
    }
}

/// A Standard MIDI File under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    format: Format,
    ticks_per_quarter: u16,
    tracks: Vec<Track>,
}

impl Default for MidiFile {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiFile {
    /// Single-track format at the default resolution, with no tracks.
    pub fn new() -> Self {
        MidiFile {
            format: Format::SingleTrack,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            tracks: Vec::new(),
        }
    }

    pub fn with_ticks_per_quarter(mut self, ticks_per_quarter: u16) -> Self {
        self.ticks_per_quarter = ticks_per_quarter;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Append an empty track and return its index.
    pub fn add_track(&mut self) -> usize {
        self.tracks.push(Track::default());
        self.tracks.len() - 1
    }

    pub fn add_note_on(
        &mut self,
        track: usize,
        delta: i64,
        note: Note,
        velocity: u8,
        channel: u8,
    ) -> Result<(), MidiError> {
        let delta = check_delta(delta)?;
        let channel = check_channel(channel)?;
        let velocity = check_velocity(velocity)?;
        self.track_mut(track)?.events.push(TrackEvent::NoteOn {
            delta,
            channel,
            note,
            velocity,
        });
        Ok(())
    }

    pub fn add_note_off(
        &mut self,
        track: usize,
        delta: i64,
        note: Note,
        velocity: u8,
        channel: u8,
    ) -> Result<(), MidiError> {
        let delta = check_delta(delta)?;
        let channel = check_channel(channel)?;
        let velocity = check_velocity(velocity)?;
        self.track_mut(track)?.events.push(TrackEvent::NoteOff {
            delta,
            channel,
            note,
            velocity,
        });
        Ok(())
    }

    /// A sounding note: note-on at delta 0, then note-off `duration` ticks
    /// later.
    pub fn add_note(
        &mut self,
        track: usize,
        duration: i64,
        note: Note,
        articulation: Articulation,
    ) -> Result<(), MidiError> {
        let duration = check_delta(duration)?;
        let channel = check_channel(articulation.channel)?;
        let velocity = check_velocity(articulation.velocity)?;
        let release_velocity = check_velocity(articulation.release_velocity)?;
        let events = &mut self.track_mut(track)?.events;
        events.push(TrackEvent::NoteOn {
            delta: 0,
            channel,
            note,
            velocity,
        });
        events.push(TrackEvent::NoteOff {
            delta: duration,
            channel,
            note,
            velocity: release_velocity,
        });
        Ok(())
    }

    /// Spread a chord's voicing over tracks `first_track`, `+1` and `+2`.
    pub fn add_chord(
        &mut self,
        first_track: usize,
        duration: i64,
        octave: u8,
        chord: Chord,
        articulation: Articulation,
    ) -> Result<(), MidiError> {
        let last = first_track.saturating_add(2);
        if last >= self.tracks.len() {
            return Err(MidiError::InvalidTrackIndex {
                index: last,
                count: self.tracks.len(),
            });
        }
        check_delta(duration)?;
        check_channel(articulation.channel)?;
        check_velocity(articulation.velocity)?;
        check_velocity(articulation.release_velocity)?;
        for (offset, note) in chord.voicing(octave).into_iter().enumerate() {
            self.add_note(first_track + offset, duration, note, articulation)?;
        }
        Ok(())
    }

    /// Serialize the whole file.
    ///
    /// A multi-track file still tagged `SingleTrack` is switched to
    /// `MultiTrackSync` first; the change persists on `self`.
    pub fn write<W: Write>(&mut self, writer: &mut W) -> Result<(), MidiError> {
        let track_count = u16::try_from(self.tracks.len())
            .map_err(|_| MidiError::TooManyTracks(self.tracks.len()))?;
        if track_count > 1 && self.format == Format::SingleTrack {
            tracing::debug!(track_count, "upgrading single-track format to multi-track");
            self.format = Format::MultiTrackSync;
        }

        writer.write_all(HEADER_MAGIC)?;
        write_u32_be(writer, HEADER_LENGTH)?;
        write_u16_be(writer, self.format.tag())?;
        write_u16_be(writer, track_count)?;
        write_u16_be(writer, self.ticks_per_quarter)?;

        for track in &self.tracks {
            track.write(writer)?;
        }
        Ok(())
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, MidiError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Serialize and write to a file.
    pub fn write_to_path(&mut self, path: &Path) -> Result<(), MidiError> {
        let buf = self.to_bytes()?;
        std::fs::write(path, &buf)?;
        tracing::info!(path = %path.display(), bytes = buf.len(), "wrote midi file");
        Ok(())
    }

    fn track_mut(&mut self, index: usize) -> Result<&mut Track, MidiError> {
        let count = self.tracks.len();
        self.tracks
            .get_mut(index)
            .ok_or(MidiError::InvalidTrackIndex { index, count })
    }
}

fn check_delta(delta: i64) -> Result<u32, MidiError> {
    if delta < 0 {
        return Err(MidiError::NegativeDuration(delta));
    }
    match u32::try_from(delta) {
        Ok(d) if d <= VAR_LEN_MAX => Ok(d),
        _ => Err(MidiError::DeltaTimeOverflow(delta)),
    }
}

fn check_channel(channel: u8) -> Result<u8, MidiError> {
    if channel > 0x0F {
        return Err(MidiError::InvalidChannel(channel));
    }
    Ok(channel)
}

/// Data bytes carry 7 bits; a set high bit would read as a status byte.
fn check_velocity(velocity: u8) -> Result<u8, MidiError> {
    if velocity > 0x7F {
        return Err(MidiError::InvalidVelocity(velocity));
    }
    Ok(velocity)
}
