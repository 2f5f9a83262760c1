//! Synthetic RealMedia files for tests and benches.
//!
//! The builder lays out a complete file: `.RMF`, `PROP`, optional `CONT`,
//! extra chunks, one `MDPR` per stream, one or two `DATA` chunks and, on
//! request, one `INDX` chunk per stream.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};

/// Stream declared by an `MDPR` chunk.
#[derive(Debug, Clone)]
pub enum StreamSpec {
    Audio {
        id: u16,
        version: u16,
        identity: [u8; 4],
        sample_rate: u16,
        channels: u16,
        frame_size: u16,
        bitrate: u32,
    },
    Video {
        id: u16,
        fourcc: [u8; 4],
        width: u16,
        height: u16,
        fps: u16,
        sub_id: u32,
    },
    /// Type-specific data written verbatim.
    Raw { id: u16, type_data: Vec<u8> },
}

impl StreamSpec {
    pub fn audio(id: u16, identity: [u8; 4]) -> Self {
        Self::Audio {
            id,
            version: 4,
            identity,
            sample_rate: 8000,
            channels: 1,
            frame_size: 240,
            bitrate: 8500,
        }
    }

    pub fn audio_v5(id: u16, identity: [u8; 4]) -> Self {
        match Self::audio(id, identity) {
            Self::Audio {
                identity,
                sample_rate,
                channels,
                frame_size,
                bitrate,
                ..
            } => Self::Audio {
                id,
                version: 5,
                identity,
                sample_rate,
                channels,
                frame_size,
                bitrate,
            },
            other => other,
        }
    }

    pub fn video(id: u16, fourcc: [u8; 4]) -> Self {
        Self::video_with_sub_id(id, fourcc, 0x1000_0000)
    }

    pub fn video_with_sub_id(id: u16, fourcc: [u8; 4], sub_id: u32) -> Self {
        Self::Video {
            id,
            fourcc,
            width: 320,
            height: 240,
            fps: 15,
            sub_id,
        }
    }

    pub fn raw(id: u16, type_data: Vec<u8>) -> Self {
        Self::Raw { id, type_data }
    }

    pub fn id(&self) -> u16 {
        match self {
            Self::Audio { id, .. } | Self::Video { id, .. } | Self::Raw { id, .. } => *id,
        }
    }

    fn avg_bitrate(&self) -> u32 {
        match self {
            Self::Audio { bitrate, .. } => *bitrate,
            Self::Video { .. } => 100_000,
            Self::Raw { .. } => 0,
        }
    }

    fn mime_type(&self) -> &'static str {
        match self {
            Self::Audio { .. } => "audio/x-pn-realaudio",
            Self::Video { .. } => "video/x-pn-realvideo",
            Self::Raw { .. } => "logical-fileinfo",
        }
    }

    fn type_data(&self) -> Vec<u8> {
        let mut b = BytesMut::new();
        match self {
            Self::Audio {
                version,
                identity,
                sample_rate,
                channels,
                frame_size,
                ..
            } => {
                b.put_slice(b".ra\xfd");
                b.put_u16(*version);
                b.put_bytes(0, 36);
                b.put_u16(*frame_size);
                b.put_bytes(0, 4);
                if *version == 5 {
                    b.put_bytes(0, 6);
                }
                b.put_u16(*sample_rate);
                b.put_bytes(0, 4);
                b.put_u16(*channels);
                if *version == 5 {
                    b.put_slice(b"genr");
                    b.put_slice(identity);
                } else {
                    b.put_u8(4);
                    b.put_slice(b"Int4");
                    b.put_u8(4);
                    b.put_slice(identity);
                }
                // Codec-specific trailer the parser skips via the block bound.
                b.put_bytes(0xaa, 6);
            }
            Self::Video {
                fourcc,
                width,
                height,
                fps,
                sub_id,
                ..
            } => {
                b.put_u32(34 + 8);
                b.put_slice(b"VIDO");
                b.put_slice(fourcc);
                b.put_u16(*width);
                b.put_u16(*height);
                b.put_u16(*fps);
                b.put_bytes(0, 12);
                b.put_u32(*sub_id);
                b.put_bytes(0x55, 8);
            }
            Self::Raw { type_data, .. } => b.put_slice(type_data),
        }
        b.to_vec()
    }
}

/// A packet in the data region.
#[derive(Debug, Clone)]
pub struct PacketSpec {
    pub stream_id: u16,
    pub timestamp: u32,
    pub flags: u8,
    pub payload: Vec<u8>,
}

/// Bytes of a packet header declaring `length` (< 12) followed by `length`
/// filler bytes, which is what a resyncing reader skips.
pub fn malformed_packet(length: u16) -> Vec<u8> {
    let mut b = BytesMut::new();
    b.put_u16(0);
    b.put_u16(length);
    b.put_bytes(0xee, length as usize);
    b.to_vec()
}

#[derive(Debug, Clone)]
enum DataItem {
    Packet(PacketSpec),
    Raw(Vec<u8>),
}

/// Where a packet ended up in the built file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLayout {
    pub stream_id: u16,
    pub timestamp: u32,
    pub flags: u8,
    /// Offset of the packet header.
    pub offset: u64,
    /// Offset of the payload.
    pub payload_offset: u64,
    /// Number among well-formed packets.
    pub packet_no: u32,
}

/// A built file and the offsets of its parts.
#[derive(Debug, Clone)]
pub struct Layout {
    pub bytes: Vec<u8>,
    /// Offset of the first `DATA` chunk.
    pub data_offset: u64,
    /// Offset of the first packet header.
    pub first_packet_offset: u64,
    /// Offset of the first `INDX` chunk, 0 if none.
    pub index_offset: u64,
    /// Well-formed packets in file order.
    pub packets: Vec<PacketLayout>,
}

#[derive(Debug, Clone, Default)]
pub struct RmfBuilder {
    streams: Vec<StreamSpec>,
    content: Option<[String; 4]>,
    prop_flags: u16,
    extra_chunks: Vec<([u8; 4], Option<u32>, Vec<u8>)>,
    items: Vec<DataItem>,
    declared_packets: Option<u32>,
    header_count: Option<u32>,
    index_offset: Option<u32>,
    with_index: bool,
    split_after: Option<usize>,
}

impl RmfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream(mut self, spec: StreamSpec) -> Self {
        self.streams.push(spec);
        self
    }

    pub fn content(mut self, title: &str, author: &str, copyright: &str, comment: &str) -> Self {
        self.content = Some([
            title.to_string(),
            author.to_string(),
            copyright.to_string(),
            comment.to_string(),
        ]);
        self
    }

    pub fn prop_flags(mut self, flags: u16) -> Self {
        self.prop_flags = flags;
        self
    }

    /// Extra top-level chunk placed before the `MDPR` chunks.
    pub fn chunk(mut self, tag: [u8; 4], body: Vec<u8>) -> Self {
        self.extra_chunks.push((tag, None, body));
        self
    }

    /// Extra chunk with an explicit (possibly bogus) declared size.
    pub fn chunk_with_size(mut self, tag: [u8; 4], size: u32, body: Vec<u8>) -> Self {
        self.extra_chunks.push((tag, Some(size), body));
        self
    }

    pub fn packet(mut self, stream_id: u16, timestamp: u32, flags: u8, payload: Vec<u8>) -> Self {
        self.items.push(DataItem::Packet(PacketSpec {
            stream_id,
            timestamp,
            flags,
            payload,
        }));
        self
    }

    /// Raw bytes in the packet sequence, e.g. [`malformed_packet`].
    pub fn raw_packet(mut self, bytes: Vec<u8>) -> Self {
        self.items.push(DataItem::Raw(bytes));
        self
    }

    /// Override the packet count of the first `DATA` chunk.
    pub fn declared_packets(mut self, count: u32) -> Self {
        self.declared_packets = Some(count);
        self
    }

    /// Override the header chunk count in the file header.
    pub fn header_count(mut self, count: u32) -> Self {
        self.header_count = Some(count);
        self
    }

    /// Override the index offset stored in `PROP`.
    pub fn index_offset(mut self, offset: u32) -> Self {
        self.index_offset = Some(offset);
        self
    }

    /// Append one `INDX` chunk per stream, listing every packet.
    pub fn with_index(mut self) -> Self {
        self.with_index = true;
        self
    }

    /// Put the first `n` data items in one `DATA` chunk and the rest in a
    /// second, chained one.
    pub fn split_data_after(mut self, n: usize) -> Self {
        self.split_after = Some(n);
        self
    }

    /// Header count a well-formed file of this shape declares.
    pub fn natural_header_count(&self) -> u32 {
        let cont = u32::from(self.content.is_some());
        3 + cont + self.extra_chunks.len() as u32 + self.streams.len() as u32
    }

    pub fn build(self) -> Vec<u8> {
        self.build_layout().bytes
    }

    pub fn build_layout(self) -> Layout {
        // Header length does not depend on the offsets written into it.
        let header_len = self.header_section(0, 0, 0).len() as u64;

        let split = self.split_after.unwrap_or(self.items.len()).min(self.items.len());
        let (first, second) = self.items.split_at(split);

        let mut data = BytesMut::new();
        let mut packets = Vec::new();
        let data_offset = header_len;

        let first_len = Self::data_chunk_len(first);
        let next = if second.is_empty() {
            0
        } else {
            (data_offset + first_len) as u32
        };
        let first_count = self
            .declared_packets
            .unwrap_or_else(|| Self::packet_count(first));
        self.write_data_chunk(&mut data, data_offset, first, first_count, next, &mut packets);
        if !second.is_empty() {
            let offset = data_offset + data.len() as u64;
            self.write_data_chunk(
                &mut data,
                offset,
                second,
                Self::packet_count(second),
                0,
                &mut packets,
            );
        }

        let mut index = BytesMut::new();
        let mut index_offset = 0u64;
        if self.with_index {
            index_offset = header_len + data.len() as u64;
            self.write_index(&mut index, index_offset, &packets);
        }

        let total_packets = packets.len() as u32;
        let max_ts = packets.iter().map(|p| p.timestamp).max().unwrap_or(0);
        let mut header = self.header_section(
            self.index_offset.unwrap_or(index_offset as u32),
            data_offset as u32,
            total_packets,
        );
        debug_assert_eq!(header.len() as u64, header_len);
        // Duration in milliseconds lives at a fixed place in PROP.
        let duration_pos = 18 + 10 + 5 * 4;
        header[duration_pos..duration_pos + 4].copy_from_slice(&(max_ts / 90).to_be_bytes());

        let mut bytes = header.to_vec();
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(&index);

        Layout {
            bytes,
            data_offset,
            first_packet_offset: data_offset + 18,
            index_offset,
            packets,
        }
    }

    fn packet_count(items: &[DataItem]) -> u32 {
        items
            .iter()
            .filter(|i| matches!(i, DataItem::Packet(_)))
            .count() as u32
    }

    fn data_chunk_len(items: &[DataItem]) -> u64 {
        18 + items
            .iter()
            .map(|i| match i {
                DataItem::Packet(p) => 12 + p.payload.len() as u64,
                DataItem::Raw(b) => b.len() as u64,
            })
            .sum::<u64>()
    }

    fn header_section(&self, index_offset: u32, data_offset: u32, total_packets: u32) -> BytesMut {
        let mut b = BytesMut::new();

        b.put_slice(b".RMF");
        b.put_u32(18);
        b.put_u16(0);
        b.put_u32(0);
        b.put_u32(self.header_count.unwrap_or_else(|| self.natural_header_count()));

        b.put_slice(b"PROP");
        b.put_u32(50);
        b.put_u16(0);
        let max_packet = self
            .items
            .iter()
            .filter_map(|i| match i {
                DataItem::Packet(p) => Some(12 + p.payload.len() as u32),
                DataItem::Raw(_) => None,
            })
            .max()
            .unwrap_or(0);
        let avg_bitrate: u32 = self.streams.iter().map(StreamSpec::avg_bitrate).sum();
        b.put_u32(avg_bitrate);
        b.put_u32(avg_bitrate);
        b.put_u32(max_packet);
        b.put_u32(max_packet);
        b.put_u32(total_packets);
        b.put_u32(0); // duration, patched by build_layout
        b.put_u32(0);
        b.put_u32(index_offset);
        b.put_u32(data_offset);
        b.put_u16(self.streams.len() as u16);
        b.put_u16(self.prop_flags);

        if let Some(fields) = &self.content {
            let body: usize = fields.iter().map(|f| 2 + f.len()).sum();
            b.put_slice(b"CONT");
            b.put_u32(10 + body as u32);
            b.put_u16(0);
            for field in fields {
                b.put_u16(field.len() as u16);
                b.put_slice(field.as_bytes());
            }
        }

        for (tag, size, body) in &self.extra_chunks {
            b.put_slice(tag);
            b.put_u32(size.unwrap_or(10 + body.len() as u32));
            b.put_u16(0);
            b.put_slice(body);
        }

        for spec in &self.streams {
            let name = match spec {
                StreamSpec::Audio { .. } => "Audio Stream",
                StreamSpec::Video { .. } => "Video Stream",
                StreamSpec::Raw { .. } => "",
            };
            let mime = spec.mime_type();
            let type_data = spec.type_data();

            let size = 10 + 2 + 7 * 4 + 1 + name.len() + 1 + mime.len() + 4 + type_data.len();
            b.put_slice(b"MDPR");
            b.put_u32(size as u32);
            b.put_u16(0);
            b.put_u16(spec.id());
            b.put_u32(spec.avg_bitrate());
            b.put_u32(spec.avg_bitrate());
            b.put_u32(0);
            b.put_u32(0);
            b.put_u32(0);
            b.put_u32(0);
            b.put_u32(0);
            b.put_u8(name.len() as u8);
            b.put_slice(name.as_bytes());
            b.put_u8(mime.len() as u8);
            b.put_slice(mime.as_bytes());
            b.put_u32(type_data.len() as u32);
            b.put_slice(&type_data);
        }

        b
    }

    fn write_data_chunk(
        &self,
        b: &mut BytesMut,
        offset: u64,
        items: &[DataItem],
        count: u32,
        next: u32,
        packets: &mut Vec<PacketLayout>,
    ) {
        let start = b.len() as u64;
        b.put_slice(b"DATA");
        b.put_u32(Self::data_chunk_len(items) as u32);
        b.put_u16(0);
        b.put_u32(count);
        b.put_u32(next);

        for item in items {
            match item {
                DataItem::Packet(p) => {
                    let packet_offset = offset + (b.len() as u64 - start);
                    packets.push(PacketLayout {
                        stream_id: p.stream_id,
                        timestamp: p.timestamp,
                        flags: p.flags,
                        offset: packet_offset,
                        payload_offset: packet_offset + 12,
                        packet_no: packets.len() as u32,
                    });
                    b.put_u16(0);
                    b.put_u16(12 + p.payload.len() as u16);
                    b.put_u16(p.stream_id);
                    b.put_u32(p.timestamp);
                    b.put_u8(0);
                    b.put_u8(p.flags);
                    b.put_slice(&p.payload);
                }
                DataItem::Raw(raw) => b.put_slice(raw),
            }
        }
    }

    fn write_index(&self, b: &mut BytesMut, offset: u64, packets: &[PacketLayout]) {
        let mut ids: Vec<u16> = Vec::new();
        for p in packets {
            if !ids.contains(&p.stream_id) {
                ids.push(p.stream_id);
            }
        }

        let mut chunk_offset = offset;
        for (i, id) in ids.iter().enumerate() {
            let entries: Vec<&PacketLayout> = packets.iter().filter(|p| p.stream_id == *id).collect();
            let size = 20 + 14 * entries.len() as u64;
            let next = if i + 1 == ids.len() {
                0
            } else {
                (chunk_offset + size) as u32
            };

            b.put_slice(b"INDX");
            b.put_u32(size as u32);
            b.put_u16(0);
            b.put_u32(entries.len() as u32);
            b.put_u16(*id);
            b.put_u32(next);
            for e in entries {
                b.put_u16(0);
                b.put_u32(e.timestamp);
                b.put_u32(e.offset as u32);
                b.put_u32(e.packet_no);
            }
            chunk_offset += size;
        }
    }
}
