//! Reader for existing `epg.dat` images.

use std::path::Path;

use bytes::{Buf, Bytes};

use crate::Error;

use super::{
    FORMAT_TAG, MAGIC, ServiceTriple,
    descriptor::DescriptorKind,
    event::EventRecord,
};

/// Event record as found in the event section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub event_id: u16,
    pub date: u16,
    pub start: [u8; 3],
    pub duration: [u8; 3],
    /// Short description CRC first, then the long description CRCs.
    pub refs: Vec<u32>,
}

impl EventEntry {
    pub fn matches(&self, record: &EventRecord) -> bool {
        self.event_id == record.event_id
            && self.date == record.date.as_u16()
            && self.start == record.start.as_bytes()
            && self.duration == record.duration.as_bytes()
            && self.refs.iter().copied().eq(record.descriptors().map(|d| d.crc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSection {
    pub triple: ServiceTriple,
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionEntry {
    pub crc: u32,
    pub ref_count: u32,
    pub kind: DescriptorKind,
    pub data: Bytes,
}

/// Decoded `epg.dat` image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgDatFile {
    pub services: Vec<ServiceSection>,
    pub descriptions: Vec<DescriptionEntry>,
}

impl EpgDatFile {
    pub fn description(&self, crc: u32) -> Option<&DescriptionEntry> {
        self.descriptions
            .binary_search_by_key(&crc, |desc| desc.crc)
            .ok()
            .map(|idx| &self.descriptions[idx])
    }

    pub fn event_count(&self) -> usize {
        self.services.iter().map(|srv| srv.events.len()).sum()
    }
}

pub struct EpgDatReader;

impl EpgDatReader {
    pub fn read_file(path: impl AsRef<Path>) -> Result<EpgDatFile, Error> {
        let data = std::fs::read(path)?;

        Self::parse(&mut Bytes::from(data))
    }

    pub fn parse(input: &mut impl Buf) -> Result<EpgDatFile, Error> {
        ensure(input, 4 + FORMAT_TAG.len() + 4)?;

        let magic = input.get_u32_le();
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let mut tag = [0u8; 13];
        input.copy_to_slice(&mut tag);
        if &tag != FORMAT_TAG {
            return Err(Error::BadFormatTag);
        }

        let service_count = input.get_u32_le();
        let services = (0..service_count)
            .map(|_| Self::parse_service(input))
            .collect::<Result<Vec<_>, _>>()?;

        ensure(input, 4)?;
        let desc_count = input.get_u32_le();
        let descriptions = (0..desc_count)
            .map(|_| Self::parse_description(input))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EpgDatFile {
            services,
            descriptions,
        })
    }

    fn parse_service(input: &mut impl Buf) -> Result<ServiceSection, Error> {
        ensure(input, 16)?;

        let sid = input.get_u32_le();
        let nid = input.get_u32_le();
        let tid = input.get_u32_le();
        let event_count = input.get_u32_le();

        let events = (0..event_count)
            .map(|_| Self::parse_event(input))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ServiceSection {
            triple: ServiceTriple::new(sid, nid, tid),
            events,
        })
    }

    fn parse_event(input: &mut impl Buf) -> Result<EventEntry, Error> {
        ensure(input, EventRecord::HEADER_LEN)?;

        let _tag = input.get_u8();
        let _reserved = input.get_u8();
        let size = input.get_u8();

        let fixed = EventRecord::FIXED_LEN as u8;
        if size < fixed + 4 || (size - fixed) % 4 != 0 {
            return Err(Error::BadRecordSize(size));
        }

        ensure(input, size as usize)?;

        let event_id = input.get_u16();
        let date = input.get_u16();

        let mut start = [0u8; 3];
        input.copy_to_slice(&mut start);

        let mut duration = [0u8; 3];
        input.copy_to_slice(&mut duration);

        let refs = (0..(size - fixed) / 4).map(|_| input.get_u32_le()).collect();

        Ok(EventEntry {
            event_id,
            date,
            start,
            duration,
            refs,
        })
    }

    fn parse_description(input: &mut impl Buf) -> Result<DescriptionEntry, Error> {
        ensure(input, 10)?;

        let crc = input.get_u32_le();
        let ref_count = input.get_u32_le();
        let kind = DescriptorKind::from_u8(input.get_u8())?;
        let len = input.get_u8() as usize;

        ensure(input, len)?;
        let data = input.copy_to_bytes(len);

        Ok(DescriptionEntry {
            crc,
            ref_count,
            kind,
            data,
        })
    }
}

#[inline]
fn ensure(input: &mut impl Buf, needed: usize) -> Result<(), Error> {
    if input.remaining() < needed {
        return Err(Error::UnexpectedEof {
            needed,
            remaining: input.remaining(),
        });
    }

    Ok(())
}
