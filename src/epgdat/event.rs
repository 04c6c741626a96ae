use std::iter;

use bytes::BufMut;
use chrono::DateTime;

use crate::service::EpgEvent;

use super::{
    WritableLen,
    descriptor::Descriptor,
    time::{BcdTime, DvbDate},
};

/// One event of the event section with the description blocks it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: u16,
    pub date: DvbDate,
    pub start: BcdTime,
    pub duration: BcdTime,
    pub short: Descriptor,
    pub long: Vec<Descriptor>,
}

impl EventRecord {
    /// First byte of every record header.
    pub const HEADER_TAG: u8 = 0x01;

    /// Record header size: tag, reserved byte, data size.
    pub const HEADER_LEN: usize = 3;

    /// Event id, date, start and duration.
    pub const FIXED_LEN: usize = 10;

    /// Returns `None` when `start` is outside the representable calendar range.
    pub fn new(
        event_id: u16,
        start: i64,
        duration: u32,
        short: Descriptor,
        long: Vec<Descriptor>,
    ) -> Option<Self> {
        let start = DateTime::from_timestamp(start, 0)?;

        Some(Self {
            event_id,
            date: DvbDate::from_datetime(&start),
            start: BcdTime::from_time(&start),
            duration: BcdTime::from_duration(duration),
            short,
            long,
        })
    }

    /// Encodes the title as the short block and the description (or the
    /// title again) as the long blocks.
    pub fn from_event(event_id: u16, event: &EpgEvent, language: &[u8; 3]) -> Option<Self> {
        Self::new(
            event_id,
            event.start,
            event.duration,
            Descriptor::short(language, &event.title),
            Descriptor::long(language, event.long_text()),
        )
    }

    /// Size of the record body that follows the header.
    pub fn data_len(&self) -> u8 {
        (Self::FIXED_LEN + 4 * (1 + self.long.len())) as u8
    }

    /// Referenced blocks in on-disk order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        iter::once(&self.short).chain(self.long.iter())
    }

    pub fn write_to(&self, output: &mut impl BufMut) {
        output.put_u8(Self::HEADER_TAG);
        output.put_u8(0x00);
        output.put_u8(self.data_len());

        // id and date are big endian, unlike the rest of the file
        output.put_u16(self.event_id);
        output.put_u16(self.date.as_u16());
        output.put_slice(&self.start.as_bytes());
        output.put_slice(&self.duration.as_bytes());

        for desc in self.descriptors() {
            output.put_u32_le(desc.crc);
        }
    }
}

impl WritableLen for EventRecord {
    fn writable_len(&self) -> usize {
        Self::HEADER_LEN + self.data_len() as usize
    }
}
