//! Packet declaration macros
//!
//! [`define_packets!`] turns a declarative packet table into record structs
//! with their encoder and field decoder. [`packet_set!`] groups the packets
//! one side receives into a tagged enum dispatched by opcode.
//!
//! A declaration with more than one String16 field is rejected at compile
//! time, so such a packet never gets a generated codec:
//!
//! ```compile_fail
//! use b181_protocol::define_packets;
//! use b181_protocol::protocol::String16;
//!
//! define_packets! {
//!     SignText("sign_text") = UpdateSign, Bidirectional {
//!         x: i32,
//!         line0: String16,
//!         line1: String16,
//!     }
//! }
//! ```
//!
//! A single String16 is fine:
//!
//! ```
//! use b181_protocol::define_packets;
//! use b181_protocol::protocol::{Packet, String16};
//!
//! define_packets! {
//!     /// Chat line
//!     Chat("chat") = ChatMsg, Bidirectional {
//!         msg: String16,
//!     }
//! }
//!
//! let chat = Chat { msg: String16::from("hi") };
//! assert_eq!(chat.encode(), [0x03, 0x00, 0x02, 0x00, 0x68, 0x00, 0x69]);
//! assert_eq!(Chat::decode(&chat.encode()).unwrap(), chat);
//! ```

/// Declare packet record structs.
///
/// Each entry is `StructName("schema_name") = PacketIdVariant, Direction {
/// field: RustType, ... }`. Field types must implement `WireField`. Doc
/// comments on an entry become the schema's documentation.
///
/// Also generates `register_declared`, which adds every declared packet to a
/// `SchemaTableBuilder`.
#[macro_export]
macro_rules! define_packets {
    ($(
        $(#[doc = $doc:literal])*
        $name:ident ($schema_name:literal) = $id:ident, $direction:ident {
            $( $field:ident : $ty:ty ),* $(,)?
        }
    )*) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Default, PartialEq)]
            pub struct $name {
                $( pub $field: $ty, )*
            }

            impl $crate::protocol::codec::Packet for $name {
                const ID: $crate::protocol::types::PacketId =
                    $crate::protocol::types::PacketId::$id;
                const DIRECTION: $crate::protocol::types::Direction =
                    $crate::protocol::types::Direction::$direction;
                const NAME: &'static str = $schema_name;
                const DOC: &'static str = concat!($($doc, "\n"),*);
                const FIELDS: &'static [(&'static str, $crate::protocol::types::FieldType)] = &[
                    $( (
                        stringify!($field),
                        <$ty as $crate::protocol::types::WireField>::FIELD_TYPE,
                    ), )*
                ];

                #[allow(unused_variables)]
                fn encode_fields(&self, writer: &mut $crate::protocol::writer::PacketWriter) {
                    $( $crate::protocol::types::WireField::write(&self.$field, writer); )*
                }

                #[allow(unused_variables)]
                fn decode_fields(cursor: &mut $crate::protocol::reader::DecodeCursor<'_>) -> Self {
                    Self {
                        $( $field: cursor.take::<$ty>(), )*
                    }
                }

                fn encoded_len(&self) -> usize {
                    1 $( + $crate::protocol::types::WireField::wire_len(&self.$field) )*
                }

                fn field_values(&self) -> Vec<(&'static str, $crate::protocol::types::FieldValue)> {
                    vec![
                        $( (
                            stringify!($field),
                            $crate::protocol::types::WireField::to_value(&self.$field),
                        ), )*
                    ]
                }
            }

            const _: () = assert!(
                $crate::protocol::schema::variable_field_count(
                    <$name as $crate::protocol::codec::Packet>::FIELDS
                ) <= 1,
                concat!(
                    stringify!($name),
                    " declares more than one String16 field and needs a hand-written codec"
                )
            );
        )*

        /// Register every packet declared in this table.
        pub fn register_declared(
            builder: &mut $crate::protocol::schema::SchemaTableBuilder,
        ) -> $crate::protocol::schema::SchemaResult<()> {
            $(
                builder.register(
                    <$name as $crate::protocol::codec::Packet>::NAME,
                    <$name as $crate::protocol::codec::Packet>::ID.id(),
                    <$name as $crate::protocol::codec::Packet>::FIELDS,
                    <$name as $crate::protocol::codec::Packet>::DIRECTION,
                    <$name as $crate::protocol::codec::Packet>::DOC,
                )?;
            )*
            Ok(())
        }
    };
}

/// Group the packets one side receives into a tagged enum.
///
/// `packet_set! { pub enum Name for Side { PacketA, PacketB } }` checks at
/// compile time that every member is received by `Side` and that no two
/// members share an opcode, then generates `decode`, `encode`, `opcode`,
/// `name`, `to_record` and `From` conversions.
#[macro_export]
macro_rules! packet_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $set:ident for $side:ident {
            $( $packet:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $set {
            $( $packet($packet), )+
        }

        const _: () = {
            $(
                assert!(
                    <$packet as $crate::protocol::codec::Packet>::DIRECTION
                        .received_by($crate::protocol::types::Side::$side),
                    concat!(stringify!($packet), " is not received by ", stringify!($side))
                );
            )+
            assert!(
                $crate::protocol::schema::opcodes_unique(&[
                    $( <$packet as $crate::protocol::codec::Packet>::ID.id(), )+
                ]),
                concat!(stringify!($set), " has two packets with the same opcode")
            );
        };

        impl $set {
            pub const SIDE: $crate::protocol::types::Side = $crate::protocol::types::Side::$side;

            /// Decode one complete frame into the member its opcode names.
            pub fn decode(frame: &[u8]) -> Result<Self, $crate::protocol::codec::DecodeError> {
                let opcode = *frame
                    .first()
                    .ok_or($crate::protocol::codec::DecodeError::EmptyFrame)?;
                $(
                    if opcode == <$packet as $crate::protocol::codec::Packet>::ID.id() {
                        return <$packet as $crate::protocol::codec::Packet>::decode(frame)
                            .map(Self::$packet);
                    }
                )+
                Err($crate::protocol::codec::DecodeError::UnrecognizedOpcode {
                    opcode,
                    side: Self::SIDE,
                })
            }

            pub fn encode(&self) -> Vec<u8> {
                match self {
                    $( Self::$packet(p) => $crate::protocol::codec::Packet::encode(p), )+
                }
            }

            pub fn opcode(&self) -> u8 {
                match self {
                    $( Self::$packet(_) => <$packet as $crate::protocol::codec::Packet>::ID.id(), )+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$packet(_) => <$packet as $crate::protocol::codec::Packet>::NAME, )+
                }
            }

            pub fn to_record(&self) -> $crate::protocol::record::DynamicRecord {
                match self {
                    $( Self::$packet(p) => $crate::protocol::codec::Packet::to_record(p), )+
                }
            }
        }

        $(
            impl From<$packet> for $set {
                fn from(packet: $packet) -> Self {
                    Self::$packet(packet)
                }
            }
        )+
    };
}
