mod crc32;
mod descriptor;
mod event;
mod service_ref;
mod table;
mod time;

pub mod io;

use bytes::BufMut;

pub use crc32::ref_crc32;
pub use descriptor::{
    Descriptor, DescriptorKind, ELLIPSIS, LONG_CHUNK_LEN, MAX_LONG_CHUNKS, MAX_TITLE_LEN,
    UTF8_MARKER,
};
pub use event::EventRecord;
pub use service_ref::{ServiceRef, ServiceTriple};
pub use table::{DescriptionTable, Registered, TableEntry};
pub use time::{BcdTime, DvbDate};

/// File magic, stored little endian.
pub const MAGIC: u32 = 0x9876_5432;

/// Format tag following the magic.
pub const FORMAT_TAG: &[u8; 13] = b"ENIGMA_EPG_V8";

/// Magic, format tag and service count.
pub const HEADER_LEN: usize = 4 + FORMAT_TAG.len() + 4;

pub trait WritableLen {
    fn writable_len(&self) -> usize;
}

/// Writes the file header.
pub fn write_header(service_count: u32, output: &mut impl BufMut) {
    output.put_u32_le(MAGIC);
    output.put_slice(FORMAT_TAG);
    output.put_u32_le(service_count);
}

/// Writes the per-service prefix of the event section.
pub fn write_service_header(triple: &ServiceTriple, event_count: u32, output: &mut impl BufMut) {
    output.put_u32_le(triple.sid);
    output.put_u32_le(triple.nid);
    output.put_u32_le(triple.tid);
    output.put_u32_le(event_count);
}
