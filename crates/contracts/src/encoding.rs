//! Destination-specific payload encodings
//!
//! Encoding is a pure function of the raw payload. The encoding for a
//! destination is resolved once, at wiring time; an unknown destination name
//! is a configuration error.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Destination names with a known encoding.
pub const KNOWN_DESTINATIONS: [&str; 4] = ["rest", "grpc", "mq", "db"];

/// Wire encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// `{"data": ...}` document
    Json,
    /// Single length-delimited string field (field 1)
    Protobuf,
    /// `<record><data>...</data></record>`
    Xml,
    /// Avro `string`: zig-zag varint length + UTF-8
    Avro,
}

impl Encoding {
    /// Resolve the encoding for a destination name.
    ///
    /// # Errors
    /// [`ContractError::UnknownDestination`] for names outside
    /// [`KNOWN_DESTINATIONS`].
    pub fn for_destination(name: &str) -> Result<Self, ContractError> {
        match name {
            "rest" => Ok(Self::Json),
            "grpc" => Ok(Self::Protobuf),
            "mq" => Ok(Self::Xml),
            "db" => Ok(Self::Avro),
            other => Err(ContractError::unknown_destination(other)),
        }
    }

    pub fn encode(self, raw: &str) -> EncodedPayload {
        let body = match self {
            Self::Json => encode_json(raw),
            Self::Protobuf => encode_protobuf(raw),
            Self::Xml => encode_xml(raw),
            Self::Avro => encode_avro(raw),
        };
        EncodedPayload {
            encoding: self,
            body,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Protobuf => "protobuf",
            Self::Xml => "xml",
            Self::Avro => "avro",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload ready to hand to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub encoding: Encoding,
    pub body: Bytes,
}

impl EncodedPayload {
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

fn encode_json(raw: &str) -> Bytes {
    let doc = serde_json::json!({ "data": raw });
    Bytes::from(doc.to_string())
}

fn encode_protobuf(raw: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(raw.len() + 6);
    // field 1, wire type 2 (length-delimited)
    buf.put_u8(0x0A);
    put_varint(&mut buf, raw.len() as u64);
    buf.put_slice(raw.as_bytes());
    buf.freeze()
}

fn encode_xml(raw: &str) -> Bytes {
    let mut out = String::with_capacity(raw.len() + 32);
    out.push_str("<record><data>");
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out.push_str("</data></record>");
    Bytes::from(out)
}

fn encode_avro(raw: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(raw.len() + 10);
    let len = raw.len() as i64;
    put_varint(&mut buf, ((len << 1) ^ (len >> 63)) as u64);
    buf.put_slice(raw.as_bytes());
    buf.freeze()
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_destinations_resolve() {
        for name in KNOWN_DESTINATIONS {
            assert!(Encoding::for_destination(name).is_ok(), "{name}");
        }
        assert_eq!(Encoding::for_destination("rest").unwrap(), Encoding::Json);
        assert_eq!(Encoding::for_destination("db").unwrap(), Encoding::Avro);
    }

    #[test]
    fn test_unknown_destination_is_config_error() {
        let err = Encoding::for_destination("smtp").unwrap_err();
        assert!(matches!(err, ContractError::UnknownDestination { .. }));
        assert!(err.to_string().contains("smtp"));
    }

    #[test]
    fn test_json_wraps_payload() {
        let payload = Encoding::Json.encode("test \"quoted\"");
        let value: serde_json::Value = serde_json::from_slice(&payload.body).unwrap();
        assert_eq!(value["data"], "test \"quoted\"");
    }

    #[test]
    fn test_protobuf_field_header() {
        let payload = Encoding::Protobuf.encode("abc");
        assert_eq!(&payload.body[..], &[0x0A, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_protobuf_multibyte_length() {
        let raw = "x".repeat(300);
        let payload = Encoding::Protobuf.encode(&raw);
        // 300 = 0b1_0010_1100 -> 0xAC 0x02
        assert_eq!(&payload.body[..3], &[0x0A, 0xAC, 0x02]);
        assert_eq!(payload.len(), 303);
    }

    #[test]
    fn test_xml_escapes_markup() {
        let payload = Encoding::Xml.encode("a<b & 'c'");
        assert_eq!(
            &payload.body[..],
            b"<record><data>a&lt;b &amp; &apos;c&apos;</data></record>"
        );
    }

    #[test]
    fn test_avro_zigzag_length() {
        // length 3 -> zig-zag 6
        let payload = Encoding::Avro.encode("abc");
        assert_eq!(&payload.body[..], &[6, b'a', b'b', b'c']);
        assert_eq!(payload.encoding, Encoding::Avro);
    }

    #[test]
    fn test_empty_payload() {
        let payload = Encoding::Avro.encode("");
        assert_eq!(&payload.body[..], &[0]);
        assert!(!payload.is_empty());
    }
}
