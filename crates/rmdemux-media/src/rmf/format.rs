//! Generic format records synthesized for downstream decoders.
//!
//! RealMedia headers do not carry these structures; they are rebuilt from
//! the stream headers in the layout decoders of the PCM/bitmap world expect.

use super::codec::AudioCodec;
use super::FourCc;
use bytes::{BufMut, BytesMut};

/// Codec bytes appended to the SIPR format record. Downstream loaders
/// expect exactly these values.
pub const SIPR_EXTRA: [u8; 4] = [30, 1, 1, 0];

/// Minimal audio format descriptor (WAVEFORMATEX layout).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Trailing codec-specific bytes, counted by `cb_size`.
    pub extra: Option<[u8; 4]>,
}

impl WaveFormat {
    /// Size of the record without trailing bytes.
    pub const BASE_SIZE: usize = 18;

    /// Build the record for a stream, applying per-codec fix-ups.
    pub fn for_codec(
        codec: &AudioCodec,
        channels: u16,
        sample_rate: u16,
        avg_bitrate: u32,
        frame_size: u16,
    ) -> Self {
        let mut wf = Self {
            format_tag: codec.format_tag() as u16,
            channels,
            samples_per_sec: u32::from(sample_rate),
            avg_bytes_per_sec: avg_bitrate,
            block_align: frame_size,
            bits_per_sample: 16,
            extra: None,
        };

        match codec {
            AudioCodec::Sipr => {
                wf.bits_per_sample = 0;
                wf.avg_bytes_per_sec = 1055;
                wf.block_align = 19;
                wf.extra = Some(SIPR_EXTRA);
            }
            AudioCodec::Atrac3 => {
                wf.avg_bytes_per_sec = 8268;
                wf.block_align = 192;
            }
            _ => {}
        }

        wf
    }

    /// Number of trailing bytes after the base record.
    pub fn cb_size(&self) -> u16 {
        self.extra.map_or(0, |e| e.len() as u16)
    }

    /// Serialize as a little-endian WAVEFORMATEX followed by the trailing bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::BASE_SIZE + self.cb_size() as usize);
        buf.put_u16_le(self.format_tag);
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.samples_per_sec);
        buf.put_u32_le(self.avg_bytes_per_sec);
        buf.put_u16_le(self.block_align);
        buf.put_u16_le(self.bits_per_sample);
        buf.put_u16_le(self.cb_size());
        if let Some(extra) = self.extra {
            buf.put_slice(&extra);
        }
        buf.to_vec()
    }
}

/// Minimal video format descriptor (BITMAPINFOHEADER layout).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: FourCc,
    pub size_image: u32,
}

impl BitmapInfoHeader {
    pub const SIZE: u32 = 40;

    pub fn new(compression: FourCc, width: u16, height: u16) -> Self {
        let (width, height) = (u32::from(width), u32::from(height));
        Self {
            size: Self::SIZE,
            width,
            height,
            planes: 1,
            bit_count: 24,
            compression,
            size_image: width.saturating_mul(height).saturating_mul(3),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE as usize);
        buf.put_u32_le(self.size);
        buf.put_u32_le(self.width);
        buf.put_u32_le(self.height);
        buf.put_u16_le(self.planes);
        buf.put_u16_le(self.bit_count);
        buf.put_slice(&self.compression.0);
        buf.put_u32_le(self.size_image);
        // X/Y pixels per meter, colors used, colors important.
        buf.put_bytes(0, 16);
        buf.to_vec()
    }
}
