//! Wire type definitions
//!
//! The closed set of field types, their width and encode/decode rules, and
//! the opcode and direction vocabulary shared by every packet schema.

use std::fmt;

use super::reader::{DecodeCursor, ReadResult};
use super::string16::String16;
use super::writer::PacketWriter;

// =============================================================================
// PACKET IDS
// =============================================================================

macro_rules! packet_ids {
    ($( $variant:ident = $id:literal => $name:literal, )*) => {
        /// Every opcode the protocol defines.
        ///
        /// Includes the packets whose layout is too complex for the generated
        /// codec (chunk data, windows, entity metadata); those only appear
        /// here so logs can name them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum PacketId {
            $( $variant = $id, )*
        }

        impl PacketId {
            /// Every defined id, in opcode order.
            pub const ALL: &'static [PacketId] = &[$( PacketId::$variant, )*];

            /// Convert from a raw opcode.
            pub const fn from_id(id: u8) -> Option<Self> {
                match id {
                    $( $id => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// Protocol name of this id (e.g. `KEEP_ALIVE`).
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }
        }
    };
}

packet_ids! {
    KeepAlive = 0x00 => "KEEP_ALIVE",
    LoginRequest = 0x01 => "LOGIN_REQUEST",
    Handshake = 0x02 => "HANDSHAKE",
    ChatMsg = 0x03 => "CHAT_MSG",
    UpdateTime = 0x04 => "UPDATE_TIME",
    EntEquipment = 0x05 => "ENT_EQUIPMENT",
    SpawnPos = 0x06 => "SPAWN_POS",
    EntUse = 0x07 => "ENT_USE",
    UpdateHealth = 0x08 => "UPDATE_HEALTH",
    Respawn = 0x09 => "RESPAWN",
    PlayerOnGround = 0x0A => "PLAYER_ON_GROUND",
    PlayerPos = 0x0B => "PLAYER_POS",
    PlayerLook = 0x0C => "PLAYER_LOOK",
    PlayerPosLook = 0x0D => "PLAYER_POS_LOOK",
    PlayerDig = 0x0E => "PLAYER_DIG",
    PlayerPlace = 0x0F => "PLAYER_PLACE",
    HoldChange = 0x10 => "HOLD_CHANGE",
    UseBed = 0x11 => "USE_BED",
    EntAnimation = 0x12 => "ENT_ANIMATION",
    EntAction = 0x13 => "ENT_ACTION",
    EntSpawnNamed = 0x14 => "ENT_SPAWN_NAMED",
    EntSpawnPickup = 0x15 => "ENT_SPAWN_PICKUP",
    CollectItem = 0x16 => "COLLECT_ITEM",
    AddObj = 0x17 => "ADD_OBJ",
    EntSpawnMob = 0x18 => "ENT_SPAWN_MOB",
    EntSpawnPainting = 0x19 => "ENT_SPAWN_PAINTING",
    EntSpawnXp = 0x1A => "ENT_SPAWN_XP",
    StanceUpdate = 0x1B => "STANCE_UPDATE",
    EntVelocity = 0x1C => "ENT_VELOCITY",
    EntDestroy = 0x1D => "ENT_DESTROY",
    EntEnsureSpawn = 0x1E => "ENT_ENSURE_SPAWN",
    EntMoveRel = 0x1F => "ENT_MOVE_REL",
    EntLook = 0x20 => "ENT_LOOK",
    EntLookMoveRel = 0x21 => "ENT_LOOK_MOVE_REL",
    EntMoveTeleport = 0x22 => "ENT_MOVE_TELEPORT",
    EntStatus = 0x26 => "ENT_STATUS",
    EntAttach = 0x27 => "ENT_ATTACH",
    EntMetadata = 0x28 => "ENT_METADATA",
    EntEffect = 0x29 => "ENT_EFFECT",
    EntEffectRemove = 0x2A => "ENT_EFFECT_REMOVE",
    XpSet = 0x2B => "XP_SET",
    ChunkCache = 0x32 => "CHUNK_CACHE",
    ChunkMap = 0x33 => "CHUNK_MAP",
    BlockChangeMulti = 0x34 => "BLOCK_CHANGE_MULTI",
    BlockChange = 0x35 => "BLOCK_CHANGE",
    BlockAction = 0x36 => "BLOCK_ACTION",
    Explosion = 0x3C => "EXPLOSION",
    Sfx = 0x3D => "SFX",
    NewState = 0x46 => "NEW_STATE",
    Thunderbolt = 0x47 => "THUNDERBOLT",
    WindowOpen = 0x64 => "WINDOW_OPEN",
    WindowClose = 0x65 => "WINDOW_CLOSE",
    WindowClick = 0x66 => "WINDOW_CLICK",
    WindowSetSlot = 0x67 => "WINDOW_SET_SLOT",
    WindowSetItems = 0x68 => "WINDOW_SET_ITEMS",
    WindowUpdateProgress = 0x69 => "WINDOW_UPDATE_PROGRESS",
    WindowTransaction = 0x6A => "WINDOW_TRANSACTION",
    InvCreativeAction = 0x6B => "INV_CREATIVE_ACTION",
    UpdateSign = 0x82 => "UPDATE_SIGN",
    ItemData = 0x83 => "ITEM_DATA",
    IncrementStatistic = 0xC8 => "INCREMENT_STATISTIC",
    PlayerListItem = 0xC9 => "PLAYER_LIST_ITEM",
    ServerListPing = 0xFE => "SERVER_LIST_PING",
    Kick = 0xFF => "KICK",
}

impl PacketId {
    /// Get the numeric opcode for this id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Name for a raw opcode, `Unknown` when the protocol does not define it.
    pub fn name_for(id: u8) -> &'static str {
        Self::from_id(id).map_or("Unknown", Self::name)
    }
}

/// [`PacketId::name_for`] taking a reference, for error formatting.
pub(crate) fn opcode_name(opcode: &u8) -> &'static str {
    PacketId::name_for(*opcode)
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}({})", self.id(), self.name())
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Which way a packet layout travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    Bidirectional,
}

/// The receiving end of a connection. A peer only frames what it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Server,
    Client,
}

impl Direction {
    /// Whether a packet with this direction arrives at `side`.
    pub const fn received_by(self, side: Side) -> bool {
        matches!(
            (self, side),
            (Self::Bidirectional, _)
                | (Self::ClientToServer, Side::Server)
                | (Self::ServerToClient, Side::Client)
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClientToServer => "Client -> Server",
            Self::ServerToClient => "Server -> Client",
            Self::Bidirectional => "Both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Server, Side::Client];

    /// Index into per-side tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Server => 0,
            Self::Client => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.write_str("server"),
            Self::Client => f.write_str("client"),
        }
    }
}

// =============================================================================
// FIELD TYPE
// =============================================================================

/// The type of a field, determining its width and byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Byte,
    UByte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// 2-byte character count followed by 2 bytes per character
    String16,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        Self::Bool,
        Self::Byte,
        Self::UByte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::String16,
    ];

    /// Byte width on the wire, `None` for String16.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte | Self::UByte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::String16 => None,
        }
    }

    pub const fn is_variable(self) -> bool {
        self.fixed_width().is_none()
    }

    /// Smallest number of bytes a value of this type occupies.
    pub const fn min_width(self) -> usize {
        match self.fixed_width() {
            Some(width) => width,
            None => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::UByte => "ubyte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String16 => "string16",
        }
    }

    /// Value a freshly created record holds for this type.
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Bool => FieldValue::Bool(false),
            Self::Byte => FieldValue::Byte(0),
            Self::UByte => FieldValue::UByte(0),
            Self::Short => FieldValue::Short(0),
            Self::Int => FieldValue::Int(0),
            Self::Long => FieldValue::Long(0),
            Self::Float => FieldValue::Float(0.0),
            Self::Double => FieldValue::Double(0.0),
            Self::String16 => FieldValue::String16(String16::new()),
        }
    }

    /// Read one value of this type.
    pub fn read(self, cursor: &mut DecodeCursor<'_>) -> ReadResult<FieldValue> {
        Ok(match self {
            Self::Bool => FieldValue::Bool(cursor.read_bool()?),
            Self::Byte => FieldValue::Byte(cursor.read_i8()?),
            Self::UByte => FieldValue::UByte(cursor.read_u8()?),
            Self::Short => FieldValue::Short(cursor.read_i16()?),
            Self::Int => FieldValue::Int(cursor.read_i32()?),
            Self::Long => FieldValue::Long(cursor.read_i64()?),
            Self::Float => FieldValue::Float(cursor.read_f32()?),
            Self::Double => FieldValue::Double(cursor.read_f64()?),
            Self::String16 => FieldValue::String16(cursor.read_string16()?),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// FIELD VALUE - for schema-driven records
// =============================================================================

/// A typed value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Byte(i8),
    UByte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String16(String16),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Byte(_) => FieldType::Byte,
            Self::UByte(_) => FieldType::UByte,
            Self::Short(_) => FieldType::Short,
            Self::Int(_) => FieldType::Int,
            Self::Long(_) => FieldType::Long,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
            Self::String16(_) => FieldType::String16,
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            Self::String16(s) => s.wire_len(),
            other => other.field_type().min_width(),
        }
    }

    pub fn write(&self, writer: &mut PacketWriter) {
        match self {
            Self::Bool(v) => writer.write_bool(*v),
            Self::Byte(v) => writer.write_i8(*v),
            Self::UByte(v) => writer.write_u8(*v),
            Self::Short(v) => writer.write_i16(*v),
            Self::Int(v) => writer.write_i32(*v),
            Self::Long(v) => writer.write_i64(*v),
            Self::Float(v) => writer.write_f32(*v),
            Self::Double(v) => writer.write_f64(*v),
            Self::String16(v) => writer.write_string16(v),
        };
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::UByte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string16(&self) -> Option<&String16> {
        match self {
            Self::String16(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::UByte(v) => write!(f, "{}", v),
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.3}", v),
            Self::Double(v) => write!(f, "{:.3}", v),
            Self::String16(v) => write!(f, "\"{}\"", v),
        }
    }
}

// =============================================================================
// WIRE FIELD - static mapping from Rust types to field types
// =============================================================================

/// A Rust type that can be a packet field.
///
/// Each implementation pins the type to exactly one [`FieldType`], so the
/// generated record structs carry their layout in their field types.
pub trait WireField: Sized + Default {
    const FIELD_TYPE: FieldType;

    fn write(&self, writer: &mut PacketWriter);

    fn read(cursor: &mut DecodeCursor<'_>) -> ReadResult<Self>;

    /// Bytes this value occupies on the wire.
    fn wire_len(&self) -> usize {
        Self::FIELD_TYPE.min_width()
    }

    fn to_value(&self) -> FieldValue;
}

macro_rules! fixed_wire_field {
    ($($ty:ty => $field_type:ident, $write:ident, $read:ident;)*) => {
        $(
            impl WireField for $ty {
                const FIELD_TYPE: FieldType = FieldType::$field_type;

                fn write(&self, writer: &mut PacketWriter) {
                    writer.$write(*self);
                }

                fn read(cursor: &mut DecodeCursor<'_>) -> ReadResult<Self> {
                    cursor.$read()
                }

                fn to_value(&self) -> FieldValue {
                    FieldValue::$field_type(*self)
                }
            }
        )*
    };
}

fixed_wire_field! {
    bool => Bool, write_bool, read_bool;
    i8 => Byte, write_i8, read_i8;
    u8 => UByte, write_u8, read_u8;
    i16 => Short, write_i16, read_i16;
    i32 => Int, write_i32, read_i32;
    i64 => Long, write_i64, read_i64;
    f32 => Float, write_f32, read_f32;
    f64 => Double, write_f64, read_f64;
}

impl WireField for String16 {
    const FIELD_TYPE: FieldType = FieldType::String16;

    fn write(&self, writer: &mut PacketWriter) {
        writer.write_string16(self);
    }

    fn read(cursor: &mut DecodeCursor<'_>) -> ReadResult<Self> {
        cursor.read_string16()
    }

    fn wire_len(&self) -> usize {
        String16::wire_len(self)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::String16(self.clone())
    }
}
