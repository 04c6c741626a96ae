/// A programme event as delivered by the EPG cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgEvent {
    /// Start time, Unix seconds (UTC).
    pub start: i64,
    /// Duration in seconds.
    pub duration: u32,
    pub title: String,
    pub description: Option<String>,
}

impl EpgEvent {
    pub fn new(start: i64, duration: u32, title: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Text of the extended description, the title when there is none.
    pub fn long_text(&self) -> &str {
        self.description
            .as_deref()
            .filter(|desc| !desc.is_empty())
            .unwrap_or(&self.title)
    }
}

/// A service together with its events, in export order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgService {
    /// Service reference, `SID:NID:TID[:extra]` or an IPTV reference.
    pub reference: String,
    pub name: Option<String>,
    pub events: Vec<EpgEvent>,
}

impl EpgService {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = EpgEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn push_event(&mut self, event: EpgEvent) {
        self.events.push(event);
    }

    /// Name for log messages.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.reference)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn long_text_falls_back_to_title() {
        let event = EpgEvent::new(0, 60, "News");
        assert_eq!(event.long_text(), "News");

        let event = event.with_description("");
        assert_eq!(event.long_text(), "News");

        let event = event.with_description("Headlines");
        assert_eq!(event.long_text(), "Headlines");
    }

    #[test]
    fn label_prefers_name() {
        let service = EpgService::new("1:2:3:0");
        assert_eq!(service.label(), "1:2:3:0");
        assert_eq!(service.with_name("BBC One").label(), "BBC One");
    }
}
