use bytes::{BufMut, Bytes, BytesMut};

use crate::Error;

use super::{WritableLen, crc32::ref_crc32};

/// Character table selector for UTF-8 text (EN 300 468, annex A).
pub const UTF8_MARKER: u8 = 0x15;

/// Maximum number of title bytes kept in a short description.
pub const MAX_TITLE_LEN: usize = 240;

/// Payload size of one long description block.
pub const LONG_CHUNK_LEN: usize = 245;

/// Maximum number of long description blocks per event.
pub const MAX_LONG_CHUNKS: usize = 15;

/// Payload of the last block of a truncated long description.
pub const ELLIPSIS: &[u8] = b"...";

/// Descriptor tag of a description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DescriptorKind {
    /// Short event descriptor, carries the title.
    Short = 0x4D,
    /// Extended event descriptor, carries one chunk of the long text.
    Long = 0x4E,
}

impl DescriptorKind {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(n: u8) -> Result<Self, Error> {
        match n {
            0x4D => Ok(DescriptorKind::Short),
            0x4E => Ok(DescriptorKind::Long),
            tag => Err(Error::InvalidDescriptor(tag)),
        }
    }
}

/// One encoded description block together with its reference CRC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    pub crc: u32,
    pub data: Bytes,
}

impl Descriptor {
    pub fn new(kind: DescriptorKind, data: Bytes) -> Self {
        Self {
            kind,
            crc: ref_crc32(kind.as_u8(), &data),
            data,
        }
    }

    /// Builds the short description (title) block.
    ///
    /// Layout: `lang[3] | len + 1 | 0x15 | title | 0x00`. The trailing zero is
    /// the (empty) text length of the short event descriptor. Titles are cut
    /// at [`MAX_TITLE_LEN`] bytes.
    pub fn short(language: &[u8; 3], title: &str) -> Self {
        let title = &title.as_bytes()[..title.len().min(MAX_TITLE_LEN)];

        let mut buf = BytesMut::with_capacity(6 + title.len());
        buf.put_slice(language);
        buf.put_u8(title.len() as u8 + 1);
        buf.put_u8(UTF8_MARKER);
        buf.put_slice(title);
        buf.put_u8(0);

        Self::new(DescriptorKind::Short, buf.freeze())
    }

    /// Splits a long description into extended event blocks.
    ///
    /// Every block starts with `index << 4 | last_index`, followed by
    /// `lang[3] | 0x00 | len + 1 | 0x15 | chunk`. At most [`MAX_LONG_CHUNKS`]
    /// blocks are produced; when the text does not fit, the last one carries
    /// [`ELLIPSIS`] instead of its chunk. Empty text yields no blocks.
    pub fn long(language: &[u8; 3], text: &str) -> Vec<Self> {
        let text = text.as_bytes();
        let total = text.len().div_ceil(LONG_CHUNK_LEN);
        let count = total.min(MAX_LONG_CHUNKS);
        let truncated = total > MAX_LONG_CHUNKS;

        text.chunks(LONG_CHUNK_LEN)
            .take(count)
            .enumerate()
            .map(|(index, chunk)| {
                let chunk = if truncated && index + 1 == count {
                    ELLIPSIS
                } else {
                    chunk
                };

                let mut buf = BytesMut::with_capacity(7 + chunk.len());
                buf.put_u8(((index << 4) | (count - 1)) as u8);
                buf.put_slice(language);
                buf.put_u8(0);
                buf.put_u8(chunk.len() as u8 + 1);
                buf.put_u8(UTF8_MARKER);
                buf.put_slice(chunk);

                Self::new(DescriptorKind::Long, buf.freeze())
            })
            .collect()
    }

    /// Writes the block as stored in the description section: tag, length
    /// and the encoded bytes.
    pub fn write_to(&self, output: &mut impl BufMut) {
        output.put_u8(self.kind.as_u8());
        output.put_u8(self.data.len() as u8);
        output.put_slice(&self.data);
    }
}

impl WritableLen for Descriptor {
    fn writable_len(&self) -> usize {
        2 + self.data.len()
    }
}
