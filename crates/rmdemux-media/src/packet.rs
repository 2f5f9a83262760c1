//! Demuxed packets and the queues they are delivered to.

use crate::rmf::{StreamKind, CLOCK_RATE, DEMUX_FLAG_KEYFRAME, PACKET_FLAG_KEYFRAME};
use bytes::Bytes;
use std::collections::{BTreeMap, VecDeque};

/// One elementary-stream packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub stream_id: u16,
    pub kind: StreamKind,
    /// Payload, already byte-swapped for codecs that need it.
    pub data: Bytes,
    /// Timestamp in 90 kHz ticks.
    pub timestamp: u32,
    /// File offset of the payload.
    pub pos: u64,
    /// Packet flags as stored in the file.
    pub flags: u8,
}

impl Packet {
    /// Presentation time in seconds.
    pub fn pts(&self) -> f64 {
        f64::from(self.timestamp) / CLOCK_RATE
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags & PACKET_FLAG_KEYFRAME != 0
    }

    /// Flags in the form downstream consumers expect.
    pub fn demux_flags(&self) -> u32 {
        if self.is_keyframe() {
            DEMUX_FLAG_KEYFRAME
        } else {
            0
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Destination for demuxed packets. Ownership of the packet moves to the sink.
pub trait PacketSink {
    fn push(&mut self, packet: Packet);
}

impl PacketSink for Vec<Packet> {
    fn push(&mut self, packet: Packet) {
        Vec::push(self, packet);
    }
}

/// One FIFO queue per stream.
#[derive(Debug, Default)]
pub struct PacketQueues {
    queues: BTreeMap<u16, VecDeque<Packet>>,
}

impl PacketQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest packet of a stream.
    pub fn pop(&mut self, stream_id: u16) -> Option<Packet> {
        self.queues.get_mut(&stream_id)?.pop_front()
    }

    pub fn queue(&self, stream_id: u16) -> Option<&VecDeque<Packet>> {
        self.queues.get(&stream_id)
    }

    /// Number of queued packets for a stream.
    pub fn len(&self, stream_id: u16) -> usize {
        self.queues.get(&stream_id).map_or(0, VecDeque::len)
    }

    /// Number of queued packets across all streams.
    pub fn total_len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.queues.keys().copied()
    }

    /// Drop everything queued, e.g. after a seek.
    pub fn clear(&mut self) {
        self.queues.values_mut().for_each(VecDeque::clear);
    }
}

impl PacketSink for PacketQueues {
    fn push(&mut self, packet: Packet) {
        self.queues
            .entry(packet.stream_id)
            .or_default()
            .push_back(packet);
    }
}

/// Exchange every adjacent pair of bytes in place.
///
/// A trailing odd byte is left untouched.
pub fn swap_byte_pairs(data: &mut [u8]) {
    for pair in data.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}
