//! Directory response encoding
//!
//! The login client shows casts in its world list, so a cast listing is sent
//! in the shape of a world list:
//!
//! ```text
//! u8  count
//! per entry:  u8 index | str label | str host | u16 port | u8 0
//! u8  count
//! per entry:  u8 index | str cast name
//! ```
//!
//! `str` is a u16 little-endian byte length followed by UTF-8 bytes.
//! The client's counters are a single byte, so at most 255 entries are sent.

use bytes::{BufMut, Bytes, BytesMut};

use super::query::DirectoryEntry;

/// Largest number of entries a listing can carry
pub const MAX_LISTED_CASTS: usize = u8::MAX as usize;

/// Where viewers connect to watch a cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// Host shown to the client
    pub host: String,
    /// Port of the viewer endpoint
    pub port: u16,
}

impl ConnectInfo {
    /// Create connect info
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Label shown in place of a world name
pub fn viewer_count_label(count: usize) -> String {
    match count {
        0 => "no viewer".to_string(),
        1 => "1 viewer".to_string(),
        n => format!("{} viewers", n),
    }
}

/// Encode a cast listing
pub fn encode_cast_list(entries: &[DirectoryEntry], connect: &ConnectInfo) -> Bytes {
    let entries = &entries[..entries.len().min(MAX_LISTED_CASTS)];
    let mut buf = BytesMut::with_capacity(16 + entries.len() * 48);

    buf.put_u8(entries.len() as u8);
    for (index, entry) in entries.iter().enumerate() {
        buf.put_u8(index as u8);
        put_string(&mut buf, &viewer_count_label(entry.viewer_count));
        put_string(&mut buf, &connect.host);
        buf.put_u16_le(connect.port);
        buf.put_u8(0);
    }

    buf.put_u8(entries.len() as u8);
    for (index, entry) in entries.iter().enumerate() {
        buf.put_u8(index as u8);
        put_string(&mut buf, &entry.display_name);
    }

    buf.freeze()
}

fn put_string(buf: &mut BytesMut, s: &str) {
    let mut len = s.len().min(u16::MAX as usize);
    while !s.is_char_boundary(len) {
        len -= 1;
    }

    buf.put_u16_le(len as u16);
    buf.put_slice(&s.as_bytes()[..len]);
}

#[cfg(test)]
mod tests {
    use bytes::Buf;

    use super::*;

    fn entry(name: &str, viewers: usize) -> DirectoryEntry {
        DirectoryEntry {
            display_name: name.into(),
            viewer_count: viewers,
            password_protected: false,
        }
    }

    fn get_string(buf: &mut Bytes) -> String {
        let len = buf.get_u16_le() as usize;
        let s = buf.split_to(len);
        String::from_utf8(s.to_vec()).unwrap()
    }

    #[test]
    fn test_viewer_count_label() {
        assert_eq!(viewer_count_label(0), "no viewer");
        assert_eq!(viewer_count_label(1), "1 viewer");
        assert_eq!(viewer_count_label(12), "12 viewers");
    }

    #[test]
    fn test_encode_layout() {
        let entries = vec![entry("Alice", 3), entry("Bob", 0)];
        let connect = ConnectInfo::new("10.1.1.1", 7173);

        let mut buf = encode_cast_list(&entries, &connect);

        assert_eq!(buf.get_u8(), 2);
        assert_eq!(buf.get_u8(), 0);
        assert_eq!(get_string(&mut buf), "3 viewers");
        assert_eq!(get_string(&mut buf), "10.1.1.1");
        assert_eq!(buf.get_u16_le(), 7173);
        assert_eq!(buf.get_u8(), 0);
        assert_eq!(buf.get_u8(), 1);
        assert_eq!(get_string(&mut buf), "no viewer");
        assert_eq!(get_string(&mut buf), "10.1.1.1");
        assert_eq!(buf.get_u16_le(), 7173);
        assert_eq!(buf.get_u8(), 0);

        assert_eq!(buf.get_u8(), 2);
        assert_eq!(buf.get_u8(), 0);
        assert_eq!(get_string(&mut buf), "Alice");
        assert_eq!(buf.get_u8(), 1);
        assert_eq!(get_string(&mut buf), "Bob");
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_encode_caps_entry_count() {
        let entries: Vec<_> = (0..300).map(|i| entry(&format!("c{}", i), 0)).collect();
        let connect = ConnectInfo::new("h", 1);

        let mut buf = encode_cast_list(&entries, &connect);
        assert_eq!(buf.get_u8() as usize, MAX_LISTED_CASTS);
    }

    #[test]
    fn test_encode_empty() {
        let buf = encode_cast_list(&[], &ConnectInfo::new("h", 1));
        assert_eq!(&buf[..], &[0, 0]);
    }
}
