//! Packed little-endian field access for fixed-layout wire blocks.
//!
//! Both ends of the link exchange packed structures with no padding. These
//! cursors write and read one field at a time so the byte layout is spelled
//! out per type instead of depending on any in-memory representation.

/// Cursor that writes packed little-endian fields into a byte buffer.
///
/// Callers check the buffer length against the block size up front; writes
/// past the end panic.
pub struct WireWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WireWriter<'a> {
    /// Create a writer positioned at the start of `buf`.
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    #[inline]
    pub fn put_u8(&mut self, value: u8) {
        self.put_bytes(&[value]);
    }

    #[inline]
    pub fn put_u16(&mut self, value: u16) {
        self.put_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_u32(&mut self, value: u32) {
        self.put_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_i32(&mut self, value: i32) {
        self.put_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_f32(&mut self, value: f32) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Write a fixed-size float array (vectors, quaternions).
    #[inline]
    pub fn put_f32s(&mut self, values: &[f32]) {
        for &v in values {
            self.put_f32(v);
        }
    }
}

/// Cursor that reads packed little-endian fields from a byte slice.
///
/// Callers validate the slice length before reading; reads past the end panic.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    #[inline]
    pub fn get_u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    #[inline]
    pub fn get_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    #[inline]
    pub fn get_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    #[inline]
    pub fn get_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    #[inline]
    pub fn get_f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    #[inline]
    pub fn get_f32s<const N: usize>(&mut self) -> [f32; N] {
        let mut out = [0f32; N];
        for v in out.iter_mut() {
            *v = self.get_f32();
        }
        out
    }
}
