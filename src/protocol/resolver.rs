//! Frame-length resolver
//!
//! The protocol has no length prefix. A frame's length follows from its
//! schema plus, when the schema has a String16, that string's character
//! count, which may itself not have arrived yet. [`FrameResolver::resolve`]
//! works out the length from whatever is buffered and can be called again
//! with more bytes and the same [`ResolverState`] until the frame is complete.

use super::schema::SchemaTable;
use super::types::Side;
use crate::constants::{OPCODE_LEN, STRING16_PREFIX_LEN, STRING16_UNIT_LEN};

/// Outcome of one resolve call. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The next frame is this many bytes long and all of them are buffered.
    Determined(usize),
    /// More bytes are needed before the frame can be measured or completed.
    NeedMore,
    /// No schema for this opcode on this side.
    Unrecognized,
}

/// Bookkeeping for the frame currently being resolved.
///
/// Owned by one connection. Measured strings are never re-read: once the
/// open string count reaches zero the estimate is the exact frame length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverState {
    opcode: Option<u8>,
    open_strings: usize,
    estimate: usize,
}

impl ResolverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame length, once every String16 has been measured.
    pub fn known_length(&self) -> Option<usize> {
        match self.opcode {
            Some(_) if self.open_strings == 0 => Some(self.estimate),
            _ => None,
        }
    }

    /// Opcode of the frame in progress.
    pub fn pending_opcode(&self) -> Option<u8> {
        self.opcode
    }

    pub fn open_strings(&self) -> usize {
        self.open_strings
    }

    /// Running length estimate: fixed widths plus every string measured so far.
    pub fn estimate(&self) -> usize {
        self.estimate
    }

    pub fn is_idle(&self) -> bool {
        self.opcode.is_none()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Measures frames received by one side.
#[derive(Debug, Clone, Copy)]
pub struct FrameResolver<'a> {
    table: &'a SchemaTable,
    side: Side,
}

impl<'a> FrameResolver<'a> {
    pub fn new(table: &'a SchemaTable, side: Side) -> Self {
        Self { table, side }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Resolve the length of the frame starting at `buffered[0]`, which holds
    /// `opcode`.
    ///
    /// `NeedMore` leaves `state` holding whatever was learned so a later
    /// call only looks at the new bytes. `Determined` is returned only once
    /// the whole frame is buffered, and resets `state` for the next frame.
    pub fn resolve(&self, opcode: u8, buffered: &[u8], state: &mut ResolverState) -> Resolution {
        let Some(schema) = self.table.lookup(opcode, self.side) else {
            return Resolution::Unrecognized;
        };

        if state.opcode != Some(opcode) {
            *state = ResolverState {
                opcode: Some(opcode),
                open_strings: schema.variable_field_count(),
                estimate: schema.min_frame_len(),
            };
        }

        if state.open_strings > 0 {
            // Schemas carry at most one String16, so none is measured yet.
            let mut offset = OPCODE_LEN;
            for field in schema.fields() {
                match field.field_type.fixed_width() {
                    Some(width) => offset += width,
                    None => {
                        if buffered.len() < offset + STRING16_PREFIX_LEN {
                            return Resolution::NeedMore;
                        }
                        let count = u16::from_be_bytes([buffered[offset], buffered[offset + 1]]);
                        offset += string16_span(count);
                    }
                }
            }
            state.open_strings = 0;
            state.estimate = offset;
        }

        if buffered.len() >= state.estimate {
            let len = state.estimate;
            state.reset();
            Resolution::Determined(len)
        } else {
            Resolution::NeedMore
        }
    }

    /// Resolve the frame at the start of `buffered` with a throwaway state.
    pub fn resolve_frame(&self, buffered: &[u8]) -> Resolution {
        match buffered.first() {
            Some(&opcode) => self.resolve(opcode, buffered, &mut ResolverState::new()),
            None => Resolution::NeedMore,
        }
    }
}

/// Bytes a String16 with `count` characters occupies.
pub const fn string16_span(count: u16) -> usize {
    STRING16_PREFIX_LEN + STRING16_UNIT_LEN * count as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::Packet;
    use crate::protocol::packets::{
        ChatMessage, EntSpawnNamed, KeepAlive, LoginRequestC2s, ServerListPing, WindowOpen,
    };
    use crate::protocol::string16::String16;
    use proptest::prelude::*;

    fn table() -> SchemaTable {
        SchemaTable::standard().unwrap()
    }

    /// Feed `frame` one byte at a time and return each result.
    fn feed_bytewise(resolver: &FrameResolver<'_>, frame: &[u8]) -> Vec<Resolution> {
        let mut state = ResolverState::new();
        (1..=frame.len())
            .map(|n| resolver.resolve(frame[0], &frame[..n], &mut state))
            .collect()
    }

    #[test]
    fn test_fixed_width_frame() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);
        let frame = KeepAlive { keep_alive_id: 42 }.encode();

        let mut state = ResolverState::new();
        assert_eq!(resolver.resolve(0x00, &frame[..1], &mut state), Resolution::NeedMore);
        assert_eq!(state.known_length(), Some(5));
        assert_eq!(resolver.resolve(0x00, &frame, &mut state), Resolution::Determined(5));
        assert!(state.is_idle());
    }

    #[test]
    fn test_empty_packet_frame() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);

        assert_eq!(resolver.resolve_frame(&[0xFE]), Resolution::Determined(1));
        assert_eq!(resolver.resolve_frame(&[]), Resolution::NeedMore);
        assert_eq!(ServerListPing {}.encode().len(), 1);
    }

    #[test]
    fn test_chat_needs_count_then_payload() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);
        let frame = ChatMessage {
            msg: String16::from("hi"),
        }
        .encode();
        let mut state = ResolverState::new();

        // Opcode plus the two count bytes: length known, payload missing.
        assert_eq!(resolver.resolve(0x03, &frame[..3], &mut state), Resolution::NeedMore);
        assert_eq!(state.known_length(), Some(7));
        assert_eq!(state.open_strings(), 0);

        assert_eq!(resolver.resolve(0x03, &frame[..7], &mut state), Resolution::Determined(7));
    }

    #[test]
    fn test_string_count_not_buffered() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);
        let mut state = ResolverState::new();

        assert_eq!(resolver.resolve(0x03, &[0x03, 0x00], &mut state), Resolution::NeedMore);
        assert_eq!(state.known_length(), None);
        assert_eq!(state.open_strings(), 1);
        assert_eq!(state.estimate(), 3);
    }

    #[test]
    fn test_string_after_fixed_fields() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);
        let frame = WindowOpen {
            window_id: 1,
            window_type: 0,
            title: String16::from("Chest"),
            num_slots: 27,
        }
        .encode();
        assert_eq!(frame.len(), 1 + 1 + 1 + 12 + 1);

        let results = feed_bytewise(&resolver, &frame);
        let determined: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| **r != Resolution::NeedMore)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(determined, vec![frame.len()]);
        assert_eq!(results.last(), Some(&Resolution::Determined(16)));
    }

    #[test]
    fn test_unrecognized_depends_on_side() {
        let table = table();
        let server = FrameResolver::new(&table, Side::Server);
        let client = FrameResolver::new(&table, Side::Client);
        let mut state = ResolverState::new();

        // SPAWN_POS only travels to the client.
        assert_eq!(server.resolve(0x06, &[0x06], &mut state), Resolution::Unrecognized);
        assert!(state.is_idle());
        assert_eq!(client.resolve(0x06, &[0x06], &mut state), Resolution::NeedMore);
        assert_eq!(server.resolve_frame(&[0x17]), Resolution::Unrecognized);
        assert_eq!(server.resolve_frame(&[0x82]), Resolution::Unrecognized);
    }

    #[test]
    fn test_state_restarts_on_new_opcode() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Server);
        let mut state = ResolverState::new();

        assert_eq!(resolver.resolve(0x03, &[0x03, 0x00, 0x05], &mut state), Resolution::NeedMore);
        assert_eq!(state.known_length(), Some(13));

        assert_eq!(
            resolver.resolve(0x00, &[0x00, 0x00, 0x00, 0x00, 0x01], &mut state),
            Resolution::Determined(5)
        );
    }

    #[test]
    fn test_login_lengths_per_side() {
        let table = table();
        let frame = LoginRequestC2s {
            protocol_ver: 17,
            username: String16::from("Notch"),
            ..Default::default()
        }
        .encode();

        for side in Side::BOTH {
            let resolver = FrameResolver::new(&table, side);
            assert_eq!(resolver.resolve_frame(&frame), Resolution::Determined(33));
        }
    }

    #[test]
    fn test_bytewise_matches_whole_buffer_for_every_schema() {
        let table = table();
        for side in Side::BOTH {
            let resolver = FrameResolver::new(&table, side);
            for schema in table.received_by(side) {
                let mut record = schema.default_record();
                for (name, value) in record.fields.iter_mut() {
                    if value.as_string16().is_some() {
                        *value = crate::protocol::types::FieldValue::String16(String16::from(*name));
                    }
                }
                let frame = schema.encode_record(&record);
                let whole = resolver.resolve_frame(&frame);
                assert_eq!(whole, Resolution::Determined(frame.len()), "{}", schema);

                let results = feed_bytewise(&resolver, &frame);
                let (last, rest) = results.split_last().unwrap();
                assert_eq!(*last, whole, "{}", schema);
                assert!(rest.iter().all(|r| *r == Resolution::NeedMore), "{}", schema);
            }
        }
    }

    #[test]
    fn test_back_to_back_frames() {
        let table = table();
        let resolver = FrameResolver::new(&table, Side::Client);
        let mut stream = EntSpawnNamed {
            eid: 7,
            name: String16::from("Notch"),
            ..Default::default()
        }
        .encode();
        let first_len = stream.len();
        stream.extend(KeepAlive { keep_alive_id: 1 }.encode());

        assert_eq!(resolver.resolve_frame(&stream), Resolution::Determined(first_len));
        assert_eq!(
            resolver.resolve_frame(&stream[first_len..]),
            Resolution::Determined(5)
        );
    }

    #[test]
    fn test_helpers() {
        assert_eq!(string16_span(0), 2);
        assert_eq!(string16_span(2), 6);
        assert_eq!(string16_span(u16::MAX), 2 + 2 * 65535);
    }

    proptest! {
        #[test]
        fn prop_split_point_does_not_change_length(
            text in "[a-zA-Z0-9 ]{0,40}",
            eid in any::<i32>(),
            split in 0usize..200,
        ) {
            let table = table();
            let resolver = FrameResolver::new(&table, Side::Client);
            let frame = EntSpawnNamed {
                eid,
                name: String16::from(text.as_str()),
                ..Default::default()
            }
            .encode();
            let split = split.min(frame.len());

            let mut state = ResolverState::new();
            let first = resolver.resolve(frame[0], &frame[..split.max(1)], &mut state);
            if split < frame.len() {
                prop_assert_eq!(first, Resolution::NeedMore);
            }
            let second = resolver.resolve(frame[0], &frame, &mut state);
            let expected = Resolution::Determined(frame.len());
            prop_assert!(first == expected || second == expected);
        }
    }
}
