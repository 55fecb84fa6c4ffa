//! Growable byte buffer with a read cursor.
//!
//! Used for handshake message reassembly and serialization, and for the
//! raw record buffers. A buffer distinguishes "wiped" (never written since
//! the last wipe) from "drained" (written, then fully read), because the
//! outbound driver uses the wiped flag to decide whether a message still
//! needs to be encoded.

/// Byte buffer with separate write and read positions.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
    read: usize,
    wiped: bool,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// Create an empty, wiped buffer.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            read: 0,
            wiped: true,
        }
    }

    /// Whether the buffer has not been written since the last wipe.
    pub fn is_wiped(&self) -> bool {
        self.wiped
    }

    /// Number of bytes written since the last wipe.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no bytes have been written since the last wipe.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of written bytes not yet consumed by the read cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read
    }

    /// Append bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.wiped = false;
        self.data.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, byte: u8) {
        self.wiped = false;
        self.data.push(byte);
    }

    /// Overwrite already-written bytes starting at `at`.
    ///
    /// Panics if the range was never written; callers back-patch headers
    /// they wrote themselves.
    pub fn overwrite(&mut self, at: usize, bytes: &[u8]) {
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
    }

    /// All bytes written since the last wipe, ignoring the read cursor.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Unconsumed bytes.
    pub fn peek(&self) -> &[u8] {
        &self.data[self.read..]
    }

    /// Consume and return up to `n` bytes.
    pub fn take(&mut self, n: usize) -> &[u8] {
        let n = n.min(self.remaining());
        let start = self.read;
        self.read += n;
        &self.data[start..start + n]
    }

    /// Advance the read cursor by up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.read = (self.read + n).min(self.data.len());
    }

    /// Clear contents and cursor; keeps the backing allocation.
    pub fn wipe(&mut self) {
        self.data.clear();
        self.read = 0;
        self.wiped = true;
    }

    /// Wipe and free the backing allocation.
    pub fn release(&mut self) {
        self.wipe();
        self.data = Vec::new();
    }
}
