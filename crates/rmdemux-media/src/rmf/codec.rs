//! Codec identities found in media-properties blocks.

use super::FourCc;

/// AC3 carried with byte-swapped 16-bit words.
pub const FORMAT_AC3: u32 = 0x2000;
/// SiproLab ACELP.net.
pub const FORMAT_SIPR: u32 = 0x130;
/// Sony ATRAC3.
pub const FORMAT_ATRAC3: u32 = 0x270;

/// Audio codec, keyed by the 4-character identity in the audio header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// `dnet`: RealAudio 3.0, AC3 in swapped byte order.
    Dnet,
    /// `sipr`: SiproLab ACELP.net.
    Sipr,
    /// `cook`: RealAudio G2. Not supported.
    Cook,
    /// `atrc`: ATRAC3 (RealAudio 8).
    Atrac3,
    Other(FourCc),
}

impl AudioCodec {
    pub fn from_identity(identity: FourCc) -> Self {
        match &identity.0 {
            b"dnet" => Self::Dnet,
            b"sipr" => Self::Sipr,
            b"cook" => Self::Cook,
            b"atrc" => Self::Atrac3,
            _ => Self::Other(identity),
        }
    }

    /// Internal codec tag stored in the audio format record.
    pub fn format_tag(&self) -> u32 {
        match self {
            Self::Dnet => FORMAT_AC3,
            Self::Sipr => FORMAT_SIPR,
            Self::Atrac3 => FORMAT_ATRAC3,
            Self::Cook => FourCc(*b"cook").packed(),
            Self::Other(tag) => tag.packed(),
        }
    }

    /// Whether streams with this codec are registered for demuxing.
    ///
    /// ATRAC3 has no decoder either, but its packets are still routed.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Dnet | Self::Sipr | Self::Atrac3)
    }

    /// Whether payloads need every byte pair swapped.
    pub fn swaps_bytes(&self) -> bool {
        matches!(self, Self::Dnet)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dnet => "RealAudio 3.0 (DNET, byte-swapped AC3)",
            Self::Sipr => "SiproLab ACELP.net",
            Self::Cook => "RealAudio G2 (COOK)",
            Self::Atrac3 => "Sony ATRAC3 (RealAudio 8)",
            Self::Other(_) => "Unknown",
        }
    }
}

/// Sub-identifier that follows the video header's fixed fields.
///
/// RV10 streams come in two bitstream revisions sharing one fourcc; the
/// sub-identifier tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSubId {
    /// Sub id 0, RealVideo 1.0.
    Rv10,
    /// Sub id 3, the RealVideo 1.0 revision decoded as `RV13`.
    Rv13,
    /// RealVideo 2.0.
    Rv20,
    Unknown(u32),
}

impl VideoSubId {
    pub fn from_u32(id: u32) -> Self {
        match id {
            0x1000_0000 => Self::Rv10,
            0x1000_3000 | 0x1000_3001 => Self::Rv13,
            0x2000_1000 | 0x2010_0001 => Self::Rv20,
            other => Self::Unknown(other),
        }
    }

    /// Effective codec tag for a stream declaring `nominal`.
    pub fn effective_fourcc(&self, nominal: FourCc) -> FourCc {
        match self {
            Self::Rv13 => FourCc::RV13,
            _ => nominal,
        }
    }
}

/// Human readable name for a video fourcc.
pub fn video_codec_name(fourcc: FourCc) -> &'static str {
    match fourcc {
        FourCc::RV10 => "RealVideo 1.0 (H.263)",
        FourCc::RV13 => "RealVideo 1.3 (H.263)",
        FourCc::RV20 => "RealVideo 2.0",
        FourCc::RV30 => "RealVideo 3.0",
        FourCc::RV40 => "RealVideo 4.0",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_identity_table() {
        assert_eq!(AudioCodec::from_identity(FourCc(*b"dnet")), AudioCodec::Dnet);
        assert_eq!(AudioCodec::from_identity(FourCc(*b"sipr")), AudioCodec::Sipr);
        assert_eq!(AudioCodec::from_identity(FourCc(*b"cook")), AudioCodec::Cook);
        assert_eq!(AudioCodec::from_identity(FourCc(*b"atrc")), AudioCodec::Atrac3);
        assert_eq!(
            AudioCodec::from_identity(FourCc(*b"28_8")),
            AudioCodec::Other(FourCc(*b"28_8"))
        );
    }

    #[test]
    fn test_registration_policy() {
        assert!(AudioCodec::Dnet.is_registered());
        assert!(AudioCodec::Sipr.is_registered());
        assert!(AudioCodec::Atrac3.is_registered());
        assert!(!AudioCodec::Cook.is_registered());
        assert!(!AudioCodec::Other(FourCc(*b"xxxx")).is_registered());
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(AudioCodec::Dnet.format_tag(), 0x2000);
        assert_eq!(AudioCodec::Sipr.format_tag(), 0x130);
        assert_eq!(AudioCodec::Atrac3.format_tag(), 0x270);
        assert_eq!(
            AudioCodec::Other(FourCc(*b"abcd")).format_tag(),
            FourCc(*b"abcd").packed()
        );
        assert!(AudioCodec::Dnet.swaps_bytes());
        assert!(!AudioCodec::Sipr.swaps_bytes());
    }

    #[test]
    fn test_video_sub_id_disambiguation() {
        assert_eq!(VideoSubId::from_u32(0x1000_3000), VideoSubId::Rv13);
        assert_eq!(VideoSubId::from_u32(0x1000_3001), VideoSubId::Rv13);
        assert_eq!(VideoSubId::from_u32(0x1000_0000), VideoSubId::Rv10);
        assert_eq!(VideoSubId::from_u32(0x2010_0001), VideoSubId::Rv20);
        assert_eq!(VideoSubId::from_u32(0x3000_0000), VideoSubId::Unknown(0x3000_0000));

        assert_eq!(VideoSubId::Rv13.effective_fourcc(FourCc::RV10), FourCc::RV13);
        assert_eq!(VideoSubId::Rv10.effective_fourcc(FourCc::RV10), FourCc::RV10);
        assert_eq!(
            VideoSubId::Unknown(7).effective_fourcc(FourCc::RV20),
            FourCc::RV20
        );
    }
}
