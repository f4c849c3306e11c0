use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Container family of an input, decided from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Wav,
    Mp3,
}

impl InputKind {
    /// `RIFF....WAVE` is WAV; an ID3v2 tag, a frame sync or anything else is
    /// handed to the MP3 decoder, whose sync scan has the final word.
    pub fn sniff(head: &[u8]) -> Self {
        if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WAVE" {
            return InputKind::Wav;
        }

        if head.starts_with(b"ID3") {
            return InputKind::Mp3;
        }
        if head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0 {
            return InputKind::Mp3;
        }

        log::debug!("No known signature at offset 0, trying MP3 decoding");
        InputKind::Mp3
    }
}

/// Buffered whole-file reader for inputs that are decoded in one pass.
pub struct InputReader {
    reader: BufReader<File>,
    len_hint: Option<u64>,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> io::Result<Self> {
        let file = File::open(input_path)?;
        let len_hint = file.metadata().ok().map(|m| m.len());

        Ok(Self {
            reader: BufReader::new(file),
            len_hint,
        })
    }

    /// File size at open time, if the platform reported one.
    pub fn len_hint(&self) -> Option<u64> {
        self.len_hint
    }

    /// Read all remaining data
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        if let Some(len) = self.len_hint() {
            data.try_reserve_exact(len as usize)
                .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        }
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}
