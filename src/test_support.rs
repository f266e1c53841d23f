//! Shared helpers for unit tests

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use crate::connection::{ChannelConnection, ChannelId, ConnectionEvents, ConnectionId, OwnerId};
use crate::persistence::{CastRecord, PersistRequest, PersistenceSink};

pub(crate) const CAST_CHANNEL: ChannelId = ChannelId(0xFFFF);

/// Connection from 10.0.0.x, where x is derived from the id
pub(crate) fn connection(id: u64) -> (Arc<ChannelConnection>, ConnectionEvents) {
    let last = (id % 250) as u8 + 1;
    connection_at(id, [10, 0, 0, last])
}

pub(crate) fn connection_at(id: u64, octets: [u8; 4]) -> (Arc<ChannelConnection>, ConnectionEvents) {
    ChannelConnection::new(ConnectionId(id), IpAddr::V4(Ipv4Addr::from(octets)))
}

/// Sink that records requests instead of sending them anywhere
#[derive(Default)]
pub(crate) struct RecordingSink {
    requests: Mutex<Vec<PersistRequest>>,
}

impl RecordingSink {
    pub(crate) fn requests(&self) -> Vec<PersistRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PersistenceSink for RecordingSink {
    fn upsert_cast_record(&self, record: CastRecord) {
        self.requests.lock().unwrap().push(PersistRequest::Upsert(record));
    }

    fn delete_cast_record(&self, owner: OwnerId) {
        self.requests.lock().unwrap().push(PersistRequest::Delete(owner));
    }
}
