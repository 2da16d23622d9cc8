//! Binary framing for journal entries.
//!
//! A journal is the plain concatenation of its records. Each record is
//! self-describing; byte-order is little-endian:
//!
//! ```text
//!    [4 bytes]   Kind tag (see `OperationKind`)
//!    [4 bytes]   Cost weight (progress ticks)
//!    [4 bytes]   Payload length `n`
//!    [n bytes]   Payload
//!                  bool  => n == 1, 0x00 or 0x01
//!                  text  => UTF-8, no terminator
//!                  empty => n == 0
//! ```
//!
//! There are no checksums. Any anomaly while decoding is fatal for the whole
//! journal: the partially decoded entries are dropped, never returned.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::types::{Action, Operation, OperationKind, PayloadShape};

use super::Journal;

/// Size of the fixed record header.
pub const HEADER_LEN: usize = 3 * size_of::<u32>();

/// Errors produced while encoding a journal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{kind} payload of {len} bytes does not fit a record")]
    PayloadTooLarge { kind: OperationKind, len: usize },
}

/// Errors produced while decoding a journal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended inside a record.
    #[error("journal truncated at byte {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown operation kind tag {tag:#x} at byte {offset}")]
    UnknownKind { tag: u32, offset: usize },

    #[error("{kind} payload must be {expected} bytes, found {found}")]
    PayloadLength {
        kind: OperationKind,
        expected: usize,
        found: usize,
    },

    #[error("invalid boolean payload byte {0:#04x}")]
    InvalidBool(u8),

    #[error("{kind} payload is not valid UTF-8")]
    InvalidText { kind: OperationKind },
}

/// Appends one framed record to `buf`.
pub fn encode_operation(op: &Operation, buf: &mut BytesMut) -> Result<(), EncodeError> {
    let kind = op.kind();
    match op.action() {
        Action::EnableRollback(enabled) => {
            buf.reserve(HEADER_LEN + 1);
            put_header(buf, kind, op.cost(), 1);
            buf.put_u8(u8::from(*enabled));
        }
        Action::CreateInterface(text)
        | Action::DeleteInterfaceByName(text)
        | Action::DeleteFile(text) => {
            let len = u32::try_from(text.len()).map_err(|_| EncodeError::PayloadTooLarge {
                kind,
                len: text.len(),
            })?;
            buf.reserve(HEADER_LEN + text.len());
            put_header(buf, kind, op.cost(), len);
            buf.put_slice(text.as_bytes());
        }
    }
    Ok(())
}

fn put_header(buf: &mut BytesMut, kind: OperationKind, cost: u32, payload_len: u32) {
    buf.put_u32_le(kind.tag());
    buf.put_u32_le(cost);
    buf.put_u32_le(payload_len);
}

/// Decodes one record from the front of `buf`.
///
/// `offset` is the position of `buf` within the whole input and is only used
/// for error reporting.
pub fn decode_operation(buf: &mut Bytes, offset: usize) -> Result<Operation, DecodeError> {
    if buf.remaining() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            offset,
            needed: HEADER_LEN - buf.remaining(),
        });
    }

    let tag = buf.get_u32_le();
    let cost = buf.get_u32_le();
    let len = buf.get_u32_le() as usize;

    let kind = OperationKind::from_tag(tag).ok_or(DecodeError::UnknownKind { tag, offset })?;

    if buf.remaining() < len {
        return Err(DecodeError::Truncated {
            offset: offset + HEADER_LEN,
            needed: len - buf.remaining(),
        });
    }
    let payload = buf.split_to(len);

    let expected = match kind.payload_shape() {
        PayloadShape::Bool => Some(1),
        PayloadShape::Text => None,
    };
    if let Some(expected) = expected
        && expected != len
    {
        return Err(DecodeError::PayloadLength {
            kind,
            expected,
            found: len,
        });
    }

    let action = match kind {
        OperationKind::EnableRollback => Action::EnableRollback(decode_bool(&payload)?),
        OperationKind::CreateInterface => Action::CreateInterface(decode_text(kind, payload)?),
        OperationKind::DeleteInterfaceByName => {
            Action::DeleteInterfaceByName(decode_text(kind, payload)?)
        }
        OperationKind::DeleteFile => Action::DeleteFile(decode_text(kind, payload)?),
    };

    Ok(Operation::new(action, cost))
}

fn decode_bool(payload: &Bytes) -> Result<bool, DecodeError> {
    match payload[0] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidBool(other)),
    }
}

fn decode_text(kind: OperationKind, payload: Bytes) -> Result<String, DecodeError> {
    String::from_utf8(payload.to_vec()).map_err(|_| DecodeError::InvalidText { kind })
}

/// Encodes every entry of `journal`, in order.
pub fn encode_journal(journal: &Journal) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    for op in journal.iter() {
        encode_operation(op, &mut buf)?;
    }
    Ok(buf.freeze())
}

/// Decodes a whole journal. An empty input is an empty journal.
pub fn decode_journal(mut bytes: Bytes) -> Result<Journal, DecodeError> {
    let total = bytes.len();
    let mut journal = Journal::new();
    while bytes.has_remaining() {
        let offset = total - bytes.remaining();
        journal.push(decode_operation(&mut bytes, offset)?);
    }
    Ok(journal)
}
