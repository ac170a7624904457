// normalize/src/events.rs

//! Normalizes a single ABCI event's attributes (base64 decode, index default).

use crate::base64_attr::decode_attribute;
use types::raw::AbciEvent;
use types::record::{NormalizedAttribute, NormalizedEvent};

pub fn normalize_event(event: &AbciEvent) -> NormalizedEvent {
    NormalizedEvent {
        event_type: event.kind.clone(),
        attributes: event
            .attributes
            .iter()
            .map(|a| NormalizedAttribute {
                key: decode_attribute(&a.key),
                value: decode_attribute(&a.value),
                index: a.index.unwrap_or(true),
            })
            .collect(),
    }
}

pub fn normalize_events(events: &[AbciEvent]) -> Vec<NormalizedEvent> {
    events.iter().map(normalize_event).collect()
}
