//! Packet buffer with a fixed capacity
//!
//! SRTP protection appends a trailer (authentication tag, SRTCP index) to the
//! packet in place. [`PacketBuffer`] keeps a logical length separate from its
//! capacity so the caller can reserve that headroom up front; the buffer never
//! grows past the capacity it was created with.

use bytes::{Bytes, BytesMut};

use crate::error::Error;
use crate::Result;

/// Owned packet bytes with a logical length and a fixed capacity
#[derive(Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    /// Backing storage; always exactly `capacity` bytes long
    storage: BytesMut,

    /// Logical packet length
    len: usize,
}

impl PacketBuffer {
    /// Create an empty buffer able to hold `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: BytesMut::zeroed(capacity),
            len: 0,
        }
    }

    /// Create a buffer holding `data` with no spare capacity
    pub fn from_slice(data: &[u8]) -> Self {
        Self::with_headroom(data, 0)
    }

    /// Create a buffer holding `data` with `headroom` spare bytes after it
    pub fn with_headroom(data: &[u8], headroom: usize) -> Self {
        let mut storage = BytesMut::zeroed(data.len() + headroom);
        storage[..data.len()].copy_from_slice(data);
        Self {
            storage,
            len: data.len(),
        }
    }

    /// Logical length of the packet
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the packet holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total bytes the packet may grow to
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Spare bytes between the logical length and the capacity
    pub fn headroom(&self) -> usize {
        self.capacity() - self.len
    }

    /// Packet bytes up to the logical length
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// Mutable packet bytes up to the logical length
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..self.len]
    }

    /// The whole backing storage, including headroom past the logical length.
    ///
    /// Crypto sessions write trailers into this region and report the new
    /// length; the caller then applies it with [`PacketBuffer::set_len`].
    pub fn as_mut_capacity_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..]
    }

    /// Change the logical length. Fails if `len` exceeds the capacity.
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            return Err(Error::BufferTooSmall {
                required: len,
                available: self.capacity(),
            });
        }
        self.len = len;
        Ok(())
    }

    /// Append bytes within the existing capacity
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        let new_len = self.len + data.len();
        if new_len > self.capacity() {
            return Err(Error::BufferTooSmall {
                required: new_len,
                available: self.capacity(),
            });
        }
        self.storage[self.len..new_len].copy_from_slice(data);
        self.len = new_len;
        Ok(())
    }

    /// Copy the packet bytes out into a shared `Bytes`
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_slice())
    }

    /// Consume the buffer, keeping only the packet bytes
    pub fn freeze(mut self) -> Bytes {
        self.storage.truncate(self.len);
        self.storage.freeze()
    }
}

impl AsRef<[u8]> for PacketBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<&[u8]> for PacketBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}

impl std::fmt::Debug for PacketBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
