//! Intel E8 call translation.
//!
//! Compressors that target x86 code rewrite the 32-bit operand of every
//! `CALL rel32` (opcode `0xE8`) into an absolute address, which repeats far
//! more often than the relative form. Decoding undoes that rewrite on the
//! first [`INTEL_MAX_FRAMES`] output frames of a stream.

use crate::tables::INTEL_MAX_FRAMES;

/// Bytes at the end of each output that are never scanned for an opcode.
const TRAILER: usize = 10;

/// E8 translation bookkeeping for one LZX stream.
#[derive(Debug, Clone, Default)]
pub struct E8Translator {
    /// Translation file size from the stream header; zero disables it.
    filesize: i32,
    /// Stream offset of the next output byte.
    curpos: i32,
    /// Set once a block could contain translated calls.
    started: bool,
    /// Outputs seen since the last reset.
    frames_read: u32,
}

impl E8Translator {
    /// Clear all state, including the file size.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Set the file size announced by the stream header.
    pub fn set_filesize(&mut self, filesize: i32) {
        self.filesize = filesize;
    }

    /// File size announced by the stream header.
    pub fn filesize(&self) -> i32 {
        self.filesize
    }

    /// Stream offset of the next output byte.
    pub fn position(&self) -> i32 {
        self.curpos
    }

    /// Note that translated data may appear from now on.
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Whether translated data may appear.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Undo the call rewrite in place on one decoded output.
    pub fn translate(&mut self, output: &mut [u8]) {
        let frame = self.frames_read;
        self.frames_read = self.frames_read.saturating_add(1);
        if frame >= INTEL_MAX_FRAMES || self.filesize == 0 {
            return;
        }

        let len = output.len() as i32;
        if output.len() <= 6 || !self.started {
            self.curpos = self.curpos.wrapping_add(len);
            return;
        }

        let mut curpos = self.curpos;
        let filesize = self.filesize;
        self.curpos = curpos.wrapping_add(len);

        let end = output.len().saturating_sub(TRAILER);
        let mut i = 0;
        while i < end {
            let opcode = output[i];
            i += 1;
            if opcode != 0xE8 {
                curpos = curpos.wrapping_add(1);
                continue;
            }

            let operand = &mut output[i..i + 4];
            let abs = i32::from_le_bytes([operand[0], operand[1], operand[2], operand[3]]);
            if abs >= curpos.wrapping_neg() && abs < filesize {
                let rel = if abs >= 0 {
                    abs.wrapping_sub(curpos)
                } else {
                    abs.wrapping_add(filesize)
                };
                operand.copy_from_slice(&rel.to_le_bytes());
            }
            i += 4;
            curpos = curpos.wrapping_add(5);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(filesize: i32) -> E8Translator {
        let mut e8 = E8Translator::default();
        e8.set_filesize(filesize);
        e8.mark_started();
        e8
    }

    #[test]
    fn test_absolute_to_relative() {
        let mut e8 = started(1 << 20);
        // CALL at offset 4 with absolute target 0x100; next instruction at 9.
        let mut out = vec![0x90; 32];
        out[4] = 0xE8;
        out[5..9].copy_from_slice(&0x100i32.to_le_bytes());

        e8.translate(&mut out);
        // curpos at the opcode is 4; rel = abs - curpos.
        let rel = i32::from_le_bytes([out[5], out[6], out[7], out[8]]);
        assert_eq!(rel, 0x100 - 4);
        assert_eq!(e8.position(), 32);
    }

    #[test]
    fn test_negative_absolute_wraps_by_filesize() {
        let filesize = 0x1000;
        let mut e8 = started(filesize);
        let mut out = vec![0u8; 24];
        out[8] = 0xE8;
        out[9..13].copy_from_slice(&(-4i32).to_le_bytes());

        e8.translate(&mut out);
        let rel = i32::from_le_bytes([out[9], out[10], out[11], out[12]]);
        assert_eq!(rel, -4 + filesize);
    }

    #[test]
    fn test_out_of_range_operand_untouched() {
        let mut e8 = started(0x1000);
        let mut out = vec![0u8; 24];
        out[0] = 0xE8;
        out[1..5].copy_from_slice(&0x2000i32.to_le_bytes());
        let before = out.clone();

        e8.translate(&mut out);
        assert_eq!(out, before);
    }

    #[test]
    fn test_trailer_not_scanned() {
        let mut e8 = started(0x1000);
        let mut out = vec![0u8; 16];
        // Index 6 is the first position inside the 10-byte trailer.
        out[6] = 0xE8;
        out[7..11].copy_from_slice(&0x10i32.to_le_bytes());
        let before = out.clone();

        e8.translate(&mut out);
        assert_eq!(out, before);
    }

    #[test]
    fn test_disabled_without_filesize() {
        let mut e8 = started(0);
        let mut out = vec![0u8; 32];
        out[0] = 0xE8;
        out[1] = 0x10;
        let before = out.clone();
        e8.translate(&mut out);
        assert_eq!(out, before);
        assert_eq!(e8.position(), 0);
    }

    #[test]
    fn test_not_started_only_advances() {
        let mut e8 = E8Translator::default();
        e8.set_filesize(0x1000);
        let mut out = vec![0u8; 32];
        out[0] = 0xE8;
        out[1] = 0x10;
        let before = out.clone();

        e8.translate(&mut out);
        assert_eq!(out, before);
        assert_eq!(e8.position(), 32);
    }

    #[test]
    fn test_position_carries_across_calls() {
        let mut e8 = started(1 << 20);
        let mut first = vec![0u8; 20];
        e8.translate(&mut first);

        let mut second = vec![0u8; 20];
        second[0] = 0xE8;
        second[1..5].copy_from_slice(&100i32.to_le_bytes());
        e8.translate(&mut second);
        let rel = i32::from_le_bytes([second[1], second[2], second[3], second[4]]);
        assert_eq!(rel, 100 - 20);
    }

    #[test]
    fn test_frame_limit() {
        let mut e8 = started(0x1000);
        e8.frames_read = INTEL_MAX_FRAMES;
        let mut out = vec![0u8; 32];
        out[0] = 0xE8;
        out[1] = 0x10;
        let before = out.clone();
        e8.translate(&mut out);
        assert_eq!(out, before);
    }
}
