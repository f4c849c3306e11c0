//! MPEG audio Layer III frame header.
//!
//! ## Layout (32 bits, MSB first)
//!
//! | bits | field |
//! |---|---|
//! | 11 | frame sync, all ones |
//! | 2 | version id: `00` MPEG-2.5, `01` reserved, `10` MPEG-2, `11` MPEG-1 |
//! | 2 | layer: `01` Layer III |
//! | 1 | protection bit, `0` means a CRC-16 follows the header |
//! | 4 | bitrate index |
//! | 2 | sampling frequency index |
//! | 1 | padding |
//! | 1 | private |
//! | 2 | channel mode |
//! | 2 | mode extension |
//! | 1 | copyright |
//! | 1 | original |
//! | 2 | emphasis |

use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::ExtractError;

pub const FRAME_HEADER_LEN: usize = 4;

/// Frame sync, 11 bits set.
pub const FRAME_SYNC: u16 = 0x7FF;

const LAYER_III: u8 = 0b01;

/// Layer III bitrates in kbps for MPEG-1, indexed by the 4-bit field.
const BITRATES_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Layer III bitrates in kbps for MPEG-2 and MPEG-2.5.
const BITRATES_V2_L3: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// MPEG-1 sampling frequencies; MPEG-2 halves them, MPEG-2.5 quarters them.
const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    /// A CRC-16 follows the header.
    pub protected: bool,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: u8,
}

impl FrameHeader {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self, ExtractError> {
        if reader.get_n::<u16>(11)? != FRAME_SYNC {
            return Err(ExtractError::InvalidSyncPattern);
        }

        let version = match reader.get_n::<u8>(2)? {
            0b00 => MpegVersion::Mpeg25,
            0b10 => MpegVersion::Mpeg2,
            0b11 => MpegVersion::Mpeg1,
            _ => return Err(ExtractError::ReservedVersion),
        };

        let layer = reader.get_n::<u8>(2)?;
        if layer != LAYER_III {
            return Err(ExtractError::UnsupportedLayer(layer));
        }

        let protected = !reader.get()?;

        let bitrate_index = reader.get_n::<u8>(4)?;
        let bitrate_kbps = match (bitrate_index, version) {
            // free format (0) cannot be sized from the header alone
            (0 | 15, _) => return Err(ExtractError::InvalidBitrate(bitrate_index)),
            (i, MpegVersion::Mpeg1) => BITRATES_V1_L3[i as usize],
            (i, _) => BITRATES_V2_L3[i as usize],
        };

        let sample_rate_index = reader.get_n::<u8>(2)?;
        let Some(&base_rate) = SAMPLE_RATES_V1.get(sample_rate_index as usize) else {
            return Err(ExtractError::InvalidSampleRate(sample_rate_index));
        };
        let sample_rate = match version {
            MpegVersion::Mpeg1 => base_rate,
            MpegVersion::Mpeg2 => base_rate / 2,
            MpegVersion::Mpeg25 => base_rate / 4,
        };

        let padding = reader.get()?;
        // private bit
        reader.skip_n(1)?;

        let channel_mode = match reader.get_n::<u8>(2)? {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };
        let mode_extension = reader.get_n::<u8>(2)?;
        let copyright = reader.get()?;
        let original = reader.get()?;
        let emphasis = reader.get_n::<u8>(2)?;

        let header = Self {
            version,
            protected,
            bitrate_kbps,
            sample_rate,
            padding,
            channel_mode,
            mode_extension,
            copyright,
            original,
            emphasis,
        };
        trace!("{header:?}");

        Ok(header)
    }

    /// Parses the header at the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let Some(head) = bytes.get(..FRAME_HEADER_LEN) else {
            return Err(ExtractError::InsufficientData {
                needed: FRAME_HEADER_LEN,
                available: bytes.len(),
            });
        };
        // cheap reject before spinning up the bit reader
        if head[0] != 0xFF || head[1] & 0xE0 != 0xE0 {
            return Err(ExtractError::InvalidSyncPattern);
        }

        Self::read(&mut BsIoSliceReader::from_slice(head))
    }

    /// Physical frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let coefficient = match self.version {
            MpegVersion::Mpeg1 => 144_000,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 72_000,
        };
        (coefficient * self.bitrate_kbps / self.sample_rate) as usize + self.padding as usize
    }

    /// Decoded samples per channel.
    pub fn samples_per_frame(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 1152,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => 576,
        }
    }

    pub fn channels(&self) -> u16 {
        match self.channel_mode {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    /// Side information length, which the frame CRC covers.
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }

    /// Whether `other` plausibly belongs to the same stream.
    pub fn is_compatible(&self, other: &FrameHeader) -> bool {
        self.version == other.version && self.sample_rate == other.sample_rate
    }
}
