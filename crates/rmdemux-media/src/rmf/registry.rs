//! Mapping from packet stream identifiers to registered streams.

use super::stream::{StreamDescriptor, StreamKind};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Default number of slots per stream kind.
pub const DEFAULT_MAX_STREAMS: usize = 32;

/// Registered audio and video streams.
///
/// Each kind has its own table of slots, filled in registration order. The
/// first slot of each kind holds the primary stream used for seeking.
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    streams: BTreeMap<u16, StreamDescriptor>,
    audio_ids: Vec<u16>,
    video_ids: Vec<u16>,
    capacity: usize,
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_STREAMS)
    }
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `capacity` slots per kind.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            streams: BTreeMap::new(),
            audio_ids: Vec::new(),
            video_ids: Vec::new(),
            capacity,
        }
    }

    /// Register a stream and return its slot within its kind.
    pub fn register(&mut self, stream: StreamDescriptor) -> Result<usize> {
        if self.streams.contains_key(&stream.id) {
            return Err(Error::DuplicateStream(stream.id));
        }

        let kind = stream.kind();
        let capacity = self.capacity;
        let ids = match kind {
            StreamKind::Audio => &mut self.audio_ids,
            StreamKind::Video => &mut self.video_ids,
        };
        if ids.len() >= capacity {
            return Err(Error::RegistryFull { kind, capacity });
        }

        ids.push(stream.id);
        let slot = ids.len() - 1;
        self.streams.insert(stream.id, stream);
        Ok(slot)
    }

    /// Kind and slot of the stream with this identifier.
    pub fn lookup(&self, id: u16) -> Option<(StreamKind, usize)> {
        if let Some(slot) = self.audio_ids.iter().position(|&a| a == id) {
            return Some((StreamKind::Audio, slot));
        }
        self.video_ids
            .iter()
            .position(|&v| v == id)
            .map(|slot| (StreamKind::Video, slot))
    }

    pub fn get(&self, id: u16) -> Option<&StreamDescriptor> {
        self.streams.get(&id)
    }

    /// Audio stream identifiers in slot order.
    pub fn audio_ids(&self) -> &[u16] {
        &self.audio_ids
    }

    /// Video stream identifiers in slot order.
    pub fn video_ids(&self) -> &[u16] {
        &self.video_ids
    }

    /// First registered audio stream.
    pub fn primary_audio(&self) -> Option<&StreamDescriptor> {
        self.audio_ids.first().and_then(|id| self.streams.get(id))
    }

    /// First registered video stream.
    pub fn primary_video(&self) -> Option<&StreamDescriptor> {
        self.video_ids.first().and_then(|id| self.streams.get(id))
    }

    /// All streams ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.values()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Slots available per kind.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
