use chrono::{DateTime, Datelike, Timelike, Utc};

/// Proleptic Gregorian ordinal of the DVB epoch minus one (1858-11-17 is day 0).
pub const PROLEPTIC_ZERO_DAY: i32 = 678_576;

/// Day number since 1858-11-17 (Modified Julian Date).
///
/// The on-disk field is 16 bits wide, so the value wraps like the broadcast
/// field does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DvbDate(u16);

impl DvbDate {
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        DvbDate((dt.num_days_from_ce() - PROLEPTIC_ZERO_DAY) as u16)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

/// Hour, minute and second packed as two decimal digits per byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BcdTime([u8; 3]);

impl BcdTime {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        BcdTime([bcd(hour), bcd(minute), bcd(second)])
    }

    pub fn from_time<T: Timelike>(time: &T) -> Self {
        Self::new(time.hour(), time.minute(), time.second())
    }

    /// Packs a duration as a time of day, hours wrap after 24.
    pub fn from_duration(secs: u32) -> Self {
        Self::new((secs / 3600) % 24, (secs / 60) % 60, secs % 60)
    }

    pub fn as_bytes(&self) -> [u8; 3] {
        self.0
    }
}

#[inline]
fn bcd(value: u32) -> u8 {
    ((value % 10) + 16 * (value / 10)) as u8
}
