//! The executable scratch region (spec §4.3 "Code region"): `AddInstruction`
//! stages encoded bytes and hands back the child address they will live at;
//! `CommitInstructions` flushes the staged bytes into the child's memory in
//! one write.

use inasm64::error::RuntimeError;
use inasm64::MAX_INSTRUCTION_BYTES;

/// One instruction staged for commit: its bytes and the child-relative
/// offset it will be written at.
#[derive(Debug, Clone)]
pub struct PendingInstruction {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// Tracks the next free offset in the child's code region and the pending
/// instructions not yet committed.
pub struct CodeRegion {
    base: usize,
    size: usize,
    committed_end: usize,
    pending: Vec<PendingInstruction>,
}

impl CodeRegion {
    pub fn new(base: usize, size: usize) -> CodeRegion {
        CodeRegion {
            base,
            size,
            committed_end: 0,
            pending: Vec::new(),
        }
    }

    /// Child address of the first not-yet-used byte, including anything
    /// still pending (spec: `AddInstruction` returns where the *next* call
    /// would land if this one were committed first).
    fn next_free_offset(&self) -> usize {
        self.committed_end + self.pending.iter().map(|p| p.bytes.len()).sum::<usize>()
    }

    /// Stages `bytes` and returns the child address they will occupy once
    /// committed. Errors `CodeBufferOverflow` if the region has no room.
    pub fn add_instruction(&mut self, bytes: &[u8]) -> Result<usize, RuntimeError> {
        if bytes.len() > MAX_INSTRUCTION_BYTES {
            return Err(RuntimeError::CodeBufferFull);
        }
        let offset = self.next_free_offset();
        if offset + bytes.len() > self.size {
            return Err(RuntimeError::CodeBufferOverflow);
        }
        self.pending.push(PendingInstruction {
            offset,
            bytes: bytes.to_vec(),
        });
        Ok(self.base + offset)
    }

    /// Drains the pending list, returning `(child_address, bytes)` pairs to
    /// write, and advances the committed watermark past them.
    pub fn commit(&mut self) -> Vec<(usize, Vec<u8>)> {
        let out = self
            .pending
            .drain(..)
            .map(|p| (self.base + p.offset, p.bytes))
            .collect::<Vec<_>>();
        if let Some((addr, bytes)) = out.last() {
            self.committed_end = (addr - self.base) + bytes.len();
        }
        out
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn committed_end(&self) -> usize {
        self.base + self.committed_end
    }

    pub fn contains(&self, address: usize) -> bool {
        address >= self.base && address < self.base + self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_sequential_and_account_for_pending_bytes() {
        let mut region = CodeRegion::new(0x1000, 4096);
        let a = region.add_instruction(&[0x90]).unwrap();
        let b = region.add_instruction(&[0x90, 0x90]).unwrap();
        assert_eq!(a, 0x1000);
        assert_eq!(b, 0x1001);
        let writes = region.commit();
        assert_eq!(writes.len(), 2);
        assert_eq!(region.committed_end(), 0x1003);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut region = CodeRegion::new(0x1000, 4);
        region.add_instruction(&[0x90, 0x90, 0x90]).unwrap();
        let err = region.add_instruction(&[0x90, 0x90]).unwrap_err();
        assert_eq!(err, RuntimeError::CodeBufferOverflow);
    }

    #[test]
    fn oversized_single_instruction_is_rejected() {
        let mut region = CodeRegion::new(0x1000, 4096);
        let err = region.add_instruction(&[0x90; 16]).unwrap_err();
        assert_eq!(err, RuntimeError::CodeBufferFull);
    }
}
