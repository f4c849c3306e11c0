use log::{debug, trace};

use crate::log_or_err;
use crate::structs::frame_header::{FRAME_HEADER_LEN, FrameHeader};
use crate::utils::crc::Crc16;
use crate::utils::errors::ExtractError;

const ID3V2_HEADER_LEN: usize = 10;
const ID3V1_TAG_LEN: usize = 128;
const CRC_LEN: usize = 2;

/// Locates Layer III frames in a byte buffer.
///
/// The extractor borrows the whole input and walks it with a cursor. The first
/// frame is only accepted ("locked") when the bytes right after it form a
/// compatible header, which keeps stray `0xFFE` patterns in leading junk from
/// being mistaken for audio. Once locked, headers are read directly at the
/// cursor; an invalid one drops the lock and scanning resumes.
///
/// ```rust,no_run
/// use wavslice::process::extract::Extractor;
///
/// let data = std::fs::read("input.mp3")?;
/// for frame in Extractor::new(&data) {
///     match frame {
///         Ok(frame) => println!("{} bytes at {}", frame.as_ref().len(), frame.offset),
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Extractor<'a> {
    data: &'a [u8],
    cursor: usize,
    reference: Option<FrameHeader>,
    finished: bool,
    crc: Crc16,
    fail_level: log::Level,
    frames_processed: usize,
    resyncs: usize,
    skipped_bytes: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let cursor = id3v2_len(data).min(data.len());
        if cursor > 0 {
            debug!("Skipping {cursor} byte ID3v2 tag");
        }

        Self {
            data,
            cursor,
            reference: None,
            finished: false,
            crc: Crc16::default(),
            fail_level: log::Level::Error,
            frames_processed: 0,
            resyncs: 0,
            skipped_bytes: 0,
        }
    }

    /// Sets the failure level for recoverable stream errors.
    ///
    /// - `log::Level::Error`: CRC mismatches are logged and the frame is kept (default)
    /// - `log::Level::Warn`: CRC mismatches are returned as errors (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    /// Times the lock was lost on an invalid header.
    pub fn resyncs(&self) -> usize {
        self.resyncs
    }

    /// Junk bytes stepped over while searching for sync.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped_bytes
    }

    fn remaining(&self) -> &'a [u8] {
        self.data.get(self.cursor..).unwrap_or_default()
    }

    /// Scans forward from `from` for a header whose successor confirms it.
    fn find_sync(&self, from: usize) -> Option<(usize, FrameHeader)> {
        let last = self.data.len().checked_sub(FRAME_HEADER_LEN)?;

        (from..=last).find_map(|pos| {
            if self.data[pos] != 0xFF || self.data[pos + 1] & 0xE0 != 0xE0 {
                return None;
            }
            let header = FrameHeader::from_bytes(&self.data[pos..]).ok()?;
            let next = self.data.get(pos + header.frame_len()..).unwrap_or_default();

            if next.len() < FRAME_HEADER_LEN || next.starts_with(b"TAG") {
                return Some((pos, header));
            }
            match FrameHeader::from_bytes(next) {
                Ok(following) if following.is_compatible(&header) => Some((pos, header)),
                _ => {
                    trace!("Rejected unconfirmed sync candidate at byte {pos}");
                    None
                }
            }
        })
    }

    fn is_trailer(&self) -> bool {
        let rest = self.remaining();
        rest.len() < FRAME_HEADER_LEN || (rest.starts_with(b"TAG") && rest.len() <= ID3V1_TAG_LEN)
    }

    fn check_crc(
        &self,
        offset: usize,
        header: &FrameHeader,
        frame: &[u8],
    ) -> Result<(), ExtractError> {
        let side_info_end = FRAME_HEADER_LEN + CRC_LEN + header.side_info_len();
        let Some(side_info) = frame.get(FRAME_HEADER_LEN + CRC_LEN..side_info_end) else {
            return Err(ExtractError::InsufficientData {
                needed: side_info_end,
                available: frame.len(),
            });
        };

        let read = u16::from_be_bytes([frame[4], frame[5]]);
        let calculated = self.crc.update(self.crc.checksum(&frame[2..4]), side_info);

        if read != calculated {
            log_or_err!(
                self,
                log::Level::Warn,
                ExtractError::CrcMismatch {
                    offset,
                    calculated,
                    read,
                }
            );
        }

        Ok(())
    }
}

impl<'a> Iterator for Extractor<'a> {
    type Item = Result<Frame<'a>, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_trailer() {
                self.finished = true;
                return None;
            }

            let start = self.cursor;
            let (offset, header) = match self.reference {
                Some(reference) => match FrameHeader::from_bytes(self.remaining()) {
                    Ok(header) if header.is_compatible(&reference) => (start, header),
                    result => {
                        let reason = result
                            .err()
                            .map_or_else(|| "incompatible header".to_string(), |e| e.to_string());
                        debug!("Lost sync at byte {start}: {reason}");
                        self.reference = None;
                        self.resyncs += 1;
                        continue;
                    }
                },
                None => match self.find_sync(start) {
                    Some(found) => found,
                    None => {
                        self.skipped_bytes += self.data.len() - start;
                        self.finished = true;
                        return None;
                    }
                },
            };

            let skipped = offset - start;
            self.skipped_bytes += skipped;
            if skipped > 0 {
                debug!("Skipped {skipped} bytes before frame at byte {offset}");
            }

            let frame_len = header.frame_len();
            let available = self.data.len() - offset;
            if available < frame_len {
                self.finished = true;
                return Some(Err(ExtractError::InsufficientData {
                    needed: frame_len,
                    available,
                }));
            }

            let input = self.data;
            let data = &input[offset..offset + frame_len];
            self.cursor = offset + frame_len;
            self.reference = Some(header);

            if header.protected {
                if let Err(e) = self.check_crc(offset, &header, data) {
                    return Some(Err(e));
                }
            }

            self.frames_processed += 1;
            return Some(Ok(Frame {
                offset,
                skipped,
                header,
                data,
            }));
        }
    }
}

/// One complete frame borrowed from the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Byte offset of the header in the input.
    pub offset: usize,
    /// Junk bytes between the previous frame and this header.
    pub skipped: usize,
    pub header: FrameHeader,
    pub data: &'a [u8],
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl Frame<'_> {
    /// Bytes the cursor advanced to produce this frame.
    pub fn physical_len(&self) -> usize {
        self.skipped + self.data.len()
    }

    /// Whether this is a Xing/Info (or VBRI) header frame: empty side
    /// information followed by the tag, carrying no audio.
    pub fn is_info_frame(&self) -> bool {
        let side_info_start = FRAME_HEADER_LEN + if self.header.protected { CRC_LEN } else { 0 };
        let side_info_end = side_info_start + self.header.side_info_len();

        let Some(side_info) = self.data.get(side_info_start..side_info_end) else {
            return false;
        };
        if side_info.iter().any(|b| *b != 0) {
            return false;
        }

        // VBRI sits at a fixed 32 bytes after the header
        let tagged_at = |offset: usize, tags: &[&[u8; 4]]| {
            self.data
                .get(offset..offset + 4)
                .is_some_and(|tag| tags.iter().any(|t| tag == *t))
        };
        tagged_at(side_info_end, &[b"Xing", b"Info"])
            || tagged_at(FRAME_HEADER_LEN + 32, &[b"VBRI"])
    }
}

/// Length of a leading ID3v2 tag, footer included, or 0 when there is none.
pub fn id3v2_len(data: &[u8]) -> usize {
    let Some(head) = data.get(..ID3V2_HEADER_LEN) else {
        return 0;
    };
    if &head[..3] != b"ID3" || head[6..10].iter().any(|b| b & 0x80 != 0) {
        return 0;
    }

    let size = head[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | (*b & 0x7F) as usize);
    let footer = if head[5] & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };

    ID3V2_HEADER_LEN + size + footer
}
