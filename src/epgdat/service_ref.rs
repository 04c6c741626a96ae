use std::fmt;

/// Service identity as stored in the event section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceTriple {
    pub sid: u32,
    pub nid: u32,
    pub tid: u32,
}

impl ServiceTriple {
    pub fn new(sid: u32, nid: u32, tid: u32) -> Self {
        Self { sid, nid, tid }
    }

    /// All-zero identity left behind by unconfigured IPTV entries.
    pub fn is_sentinel(&self) -> bool {
        self.sid == 0 && self.nid == 0 && self.tid == 0
    }
}

impl fmt::Display for ServiceTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}:{:X}:{:X}", self.sid, self.nid, self.tid)
    }
}

/// Outcome of decoding a service reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRef {
    Triple(ServiceTriple),
    /// SID, NID and TID are all zero.
    Sentinel,
    Invalid(String),
}

impl ServiceRef {
    /// Decodes `SID:NID:TID[:extra]` or an IPTV reference, where fields
    /// 3, 4 and 5 hold SID, TID and NID.
    pub fn parse(reference: &str) -> Self {
        let fields: Vec<&str> = reference.split(':').collect();

        let (sid, nid, tid) = match fields.len() {
            3 | 4 => (fields[0], fields[1], fields[2]),
            n if n >= 6 => (fields[3], fields[5], fields[4]),
            n => return ServiceRef::Invalid(format!("unexpected number of fields: {n}")),
        };

        match decode_triple(sid, nid, tid) {
            Ok(triple) if triple.is_sentinel() => ServiceRef::Sentinel,
            Ok(triple) => ServiceRef::Triple(triple),
            Err(reason) => ServiceRef::Invalid(reason),
        }
    }
}

fn decode_triple(sid: &str, nid: &str, tid: &str) -> Result<ServiceTriple, String> {
    Ok(ServiceTriple {
        sid: parse_hex("SID", sid)?,
        nid: parse_hex("NID", nid)?,
        tid: parse_hex("TID", tid)?,
    })
}

fn parse_hex(name: &str, value: &str) -> Result<u32, String> {
    let digits = value.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    u32::from_str_radix(digits, 16).map_err(|err| format!("invalid {name} '{value}': {err}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn regular_reference() {
        assert_eq!(
            ServiceRef::parse("1F:2:3:0"),
            ServiceRef::Triple(ServiceTriple::new(0x1F, 2, 3))
        );
        assert_eq!(
            ServiceRef::parse("a:b:c"),
            ServiceRef::Triple(ServiceTriple::new(0xA, 0xB, 0xC))
        );
        assert_eq!(
            ServiceRef::parse(" 0x10 :0X20:30:extra"),
            ServiceRef::Triple(ServiceTriple::new(0x10, 0x20, 0x30))
        );
    }

    #[test]
    fn iptv_reference() {
        let reference = "1:0:1:2A:3B:4C:0:0:0:0:http%3a//example.com/live.ts:Channel";

        assert_eq!(
            ServiceRef::parse(reference),
            ServiceRef::Triple(ServiceTriple::new(0x2A, 0x4C, 0x3B))
        );
    }

    #[test]
    fn sentinel_reference() {
        assert_eq!(ServiceRef::parse("0:0:0:x"), ServiceRef::Sentinel);
        assert_eq!(ServiceRef::parse("1:0:1:0:0:0:0:0:0:0:http"), ServiceRef::Sentinel);
        assert_eq!(ServiceRef::parse("00:0:000"), ServiceRef::Sentinel);
    }

    #[test]
    fn invalid_reference() {
        assert!(matches!(ServiceRef::parse("zz:1:2:0"), ServiceRef::Invalid(_)));
        assert!(matches!(ServiceRef::parse("1:2"), ServiceRef::Invalid(_)));
        assert!(matches!(ServiceRef::parse("1:2:3:4:5"), ServiceRef::Invalid(_)));
        assert!(matches!(ServiceRef::parse("1::3:0"), ServiceRef::Invalid(_)));
        assert!(matches!(ServiceRef::parse("100000000:1:1:0"), ServiceRef::Invalid(_)));
    }

    #[test]
    fn display() {
        assert_eq!(ServiceTriple::new(0x1F, 2, 0xAB).to_string(), "1F:2:AB");
    }
}
