//! CRC validation for MPEG audio frames.
//!
//! Protected frames carry a CRC-16 right after the 4-byte header. It covers
//! the last two header bytes followed by the side information.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 used by MPEG audio frame protection (x^16 + x^15 + x^2 + 1).
pub const CRC_MPEG_AUDIO_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0xFFFF,
};

/// Computes one table entry of an MSB-first CRC-16.
#[inline(always)]
pub const fn crc16(poly: u16, mut value: u16, len: usize) -> u16 {
    value <<= 8;

    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 15) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16(poly, i as u16, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u16) -> u16 {
        self.table[(index & 0xFF) as usize]
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            crc = (crc << 8) ^ self.table_entry((crc >> 8) ^ bytes[i] as u16);
            i += 1;
        }

        crc
    }

    pub const fn checksum(&self, bytes: &[u8]) -> u16 {
        self.update(self.init, bytes)
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new(&CRC_MPEG_AUDIO_ALG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        let crc = Crc16::default();
        // CRC-16/CMS catalogue check value
        assert_eq!(crc.checksum(b"123456789"), 0xAEE7);
        // same polynomial with a zero seed is CRC-16/UMTS
        assert_eq!(crc.update(0, b"123456789"), 0xFEE8);
    }

    #[test]
    fn update_is_incremental() {
        let crc = Crc16::default();
        let whole = crc.checksum(b"header+side-info");
        let split = crc.update(crc.checksum(b"header"), b"+side-info");
        assert_eq!(whole, split);
    }
}
