use std::pin::pin;

use bytes::{BufMut, Bytes, BytesMut};
use flowly::Service;
use futures::StreamExt;
use log::Level;

use crate::{
    Error,
    epgdat::{
        DescriptionTable, EventRecord, HEADER_LEN, Registered, ServiceRef, WritableLen,
        write_header, write_service_header,
    },
    service::EpgService,
};

/// Receives every user facing message of an export.
pub type LogCallback = Box<dyn FnMut(&str) + Send>;

/// Receives progress snapshots while services are encoded.
pub type ProgressCallback = Box<dyn FnMut(Progress) + Send>;

pub struct EpgWriterConfig {
    /// ISO 639 language code written into every description block.
    pub language: [u8; 3],
    /// Report progress every N encoded events, `0` disables it.
    pub progress_interval: usize,
    /// Compare block bytes when a description CRC is already known.
    pub detect_collisions: bool,
    /// File name used by [`crate::EpgWriter::in_dir`].
    pub file_name: String,
}

impl Default for EpgWriterConfig {
    fn default() -> Self {
        Self {
            language: *b"eng",
            progress_interval: 100,
            detect_collisions: true,
            file_name: String::from("epg.dat"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub services_done: usize,
    pub services_total: Option<usize>,
    pub events_done: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub services_written: u32,
    pub services_skipped: usize,
    pub events_written: usize,
    pub events_skipped: usize,
    pub collisions: usize,
}

/// Accumulates services into an in-memory `epg.dat` image.
///
/// Services are appended to the event section in push order while their
/// description blocks are collected in a CRC ordered table. The image is
/// produced by [`EpgDatEncoder::write_to`] once all services are pushed.
pub struct EpgDatEncoder {
    config: EpgWriterConfig,
    section: BytesMut,
    table: DescriptionTable,
    event_id: u16,
    sentinel_reported: bool,
    services_done: usize,
    services_total: Option<usize>,
    stats: EncodeStats,
    log: Option<LogCallback>,
    progress: Option<ProgressCallback>,
}

impl EpgDatEncoder {
    pub fn new(config: EpgWriterConfig) -> Self {
        Self {
            table: DescriptionTable::new().with_collision_check(config.detect_collisions),
            config,
            section: BytesMut::new(),
            event_id: 0,
            sentinel_reported: false,
            services_done: 0,
            services_total: None,
            stats: EncodeStats::default(),
            log: None,
            progress: None,
        }
    }

    pub fn with_log(mut self, log: impl FnMut(&str) + Send + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub(crate) fn set_log(&mut self, log: Option<LogCallback>) {
        self.log = log;
    }

    pub(crate) fn set_progress(&mut self, progress: Option<ProgressCallback>) {
        self.progress = progress;
    }

    /// Number of services the caller intends to push, reported in [`Progress`].
    pub fn with_expected_services(mut self, total: usize) -> Self {
        self.services_total = Some(total);
        self
    }

    /// Appends one service and its events.
    ///
    /// Returns `false` when the service was skipped because its reference is
    /// malformed or the all-zero IPTV placeholder.
    pub fn push_service(&mut self, service: &EpgService) -> bool {
        self.services_done += 1;

        let triple = match ServiceRef::parse(&service.reference) {
            ServiceRef::Triple(triple) => triple,
            ServiceRef::Sentinel => {
                self.stats.services_skipped += 1;

                if !self.sentinel_reported {
                    self.sentinel_reported = true;
                    self.report(
                        Level::Warn,
                        "Detected IPTV service(s) with values for [SID, NID, TID] = 0. Skipping...",
                    );
                }

                return false;
            }
            ServiceRef::Invalid(reason) => {
                self.stats.services_skipped += 1;
                let msg = format!("Getting service [{}] data error: {reason}", service.label());
                self.report(Level::Warn, &msg);

                return false;
            }
        };

        let mut records = Vec::with_capacity(service.events.len());
        for event in &service.events {
            let event_id = self.event_id.wrapping_add(1);

            match EventRecord::from_event(event_id, event, &self.config.language) {
                Some(record) => {
                    self.event_id = event_id;
                    records.push(record);
                }
                None => {
                    self.stats.events_skipped += 1;
                    let msg = format!(
                        "Event '{}' of [{}] has an unsupported start time {}. Skipping...",
                        event.title,
                        service.label(),
                        event.start
                    );
                    self.report(Level::Warn, &msg);
                }
            }
        }

        log::debug!("service {} [{triple}]: {} events", service.label(), records.len());
        write_service_header(&triple, records.len() as u32, &mut self.section);
        self.stats.services_written += 1;

        for record in &records {
            for desc in record.descriptors() {
                if self.table.register(desc) == Registered::Collision {
                    self.stats.collisions += 1;
                    let msg = format!(
                        "Description CRC {:#010x} is shared by different texts, keeping the first one.",
                        desc.crc
                    );
                    self.report(Level::Warn, &msg);
                }
            }

            record.write_to(&mut self.section);
            self.stats.events_written += 1;

            let interval = self.config.progress_interval;
            if interval > 0 && self.stats.events_written % interval == 0 {
                self.emit_progress();
            }
        }

        true
    }

    /// Closes the accumulation phase: reports final progress and a summary.
    pub fn finish(&mut self) {
        self.emit_progress();

        let msg = format!(
            "Services: {} written, {} skipped. Events: {}. Descriptions: {}.",
            self.stats.services_written,
            self.stats.services_skipped,
            self.stats.events_written,
            self.table.len()
        );
        self.report(Level::Info, &msg);
    }

    /// `true` when no description was collected, there is nothing worth writing.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn stats(&self) -> &EncodeStats {
        &self.stats
    }

    pub fn table(&self) -> &DescriptionTable {
        &self.table
    }

    pub fn config(&self) -> &EpgWriterConfig {
        &self.config
    }

    /// Writes header, event section and description section.
    pub fn write_to(&self, dst: &mut impl BufMut) {
        write_header(self.stats.services_written, dst);
        dst.put_slice(&self.section);
        self.table.write_to(dst);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.writable_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    pub(crate) fn report(&mut self, level: Level, msg: &str) {
        log::log!(level, "{msg}");

        if let Some(log) = self.log.as_mut() {
            log(msg);
        }
    }

    fn emit_progress(&mut self) {
        let progress = Progress {
            services_done: self.services_done,
            services_total: self.services_total,
            events_done: self.stats.events_written,
        };

        if let Some(callback) = self.progress.as_mut() {
            callback(progress);
        }
    }
}

impl Default for EpgDatEncoder {
    fn default() -> Self {
        Self::new(EpgWriterConfig::default())
    }
}

impl WritableLen for EpgDatEncoder {
    fn writable_len(&self) -> usize {
        HEADER_LEN + self.section.len() + self.table.writable_len()
    }
}

impl<E: flowly::Error> Service<Result<EpgService, E>> for EpgDatEncoder {
    type Out = Result<Bytes, Error<E>>;

    fn handle(
        mut self,
        input: impl futures::Stream<Item = Result<EpgService, E>> + Send,
    ) -> impl futures::Stream<Item = Self::Out> + Send {
        async_stream::stream! {
            let mut input = pin!(input);

            while let Some(res) = input.next().await {
                match res {
                    Ok(service) => {
                        self.push_service(&service);
                    },
                    Err(err) => yield Err(Error::Other(err)),
                }
            }

            self.finish();

            if !self.is_empty() {
                yield Ok(self.to_bytes());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        epgdat::io::EpgDatReader,
        service::EpgEvent,
    };

    fn news() -> EpgEvent {
        EpgEvent::new(1_700_000_000, 1800, "News")
    }

    #[test]
    fn skips_sentinel_once() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let mut encoder = EpgDatEncoder::default()
            .with_log(move |msg: &str| sink.lock().unwrap().push(msg.to_string()));

        assert!(!encoder.push_service(&EpgService::new("0:0:0:x").with_events([news()])));
        assert!(!encoder.push_service(&EpgService::new("0:0:0:y").with_events([news()])));
        assert!(encoder.push_service(&EpgService::new("1:2:3:0").with_events([news()])));

        let lines = lines.lock().unwrap();
        let sentinel = lines.iter().filter(|l| l.contains("= 0")).count();
        assert_eq!(sentinel, 1);
        assert_eq!(encoder.stats().services_skipped, 2);
        assert_eq!(encoder.stats().services_written, 1);
    }

    #[test]
    fn skips_invalid_reference() {
        let mut encoder = EpgDatEncoder::default();

        assert!(!encoder.push_service(&EpgService::new("xyz:1:2:0").with_events([news()])));
        assert!(encoder.is_empty());
        assert_eq!(encoder.stats().events_written, 0);
    }

    #[test]
    fn event_ids_are_sequential() {
        let mut encoder = EpgDatEncoder::default();
        encoder.push_service(&EpgService::new("1:2:3:0").with_events([news(), news()]));
        encoder.push_service(&EpgService::new("4:5:6:0").with_events([news()]));

        let file = EpgDatReader::parse(&mut encoder.to_bytes()).unwrap();
        let ids: Vec<u16> = file
            .services
            .iter()
            .flat_map(|srv| srv.events.iter().map(|ev| ev.event_id))
            .collect();

        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn shares_identical_titles() {
        let mut encoder = EpgDatEncoder::default();
        encoder.push_service(&EpgService::new("1:2:3:0").with_events([news()]));
        encoder.push_service(&EpgService::new("4:5:6:0").with_events([news()]));

        let table = encoder.table();
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|entry| entry.ref_count == 2));
    }

    #[test]
    fn progress_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let config = EpgWriterConfig {
            progress_interval: 2,
            ..Default::default()
        };

        let mut encoder = EpgDatEncoder::new(config)
            .with_expected_services(1)
            .with_progress(move |p| sink.lock().unwrap().push(p));

        encoder.push_service(&EpgService::new("1:2:3:0").with_events(vec![news(); 5]));
        encoder.finish();

        let seen = seen.lock().unwrap();
        let events: Vec<usize> = seen.iter().map(|p| p.events_done).collect();
        assert_eq!(events, [2, 4, 5]);
        assert_eq!(seen.last().unwrap().services_total, Some(1));
        assert_eq!(seen.last().unwrap().services_done, 1);
    }

    #[test]
    fn encoded_len_matches() {
        let mut encoder = EpgDatEncoder::default();
        let long = "e".repeat(1000);
        encoder.push_service(
            &EpgService::new("1:2:3:0").with_events([news(), news().with_description(long)]),
        );

        assert_eq!(encoder.to_bytes().len(), encoder.writable_len());
    }
}
