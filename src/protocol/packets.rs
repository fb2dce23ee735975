//! The packet table
//!
//! Every packet made only of fixed-width fields and at most one String16.
//! Packets with structured payloads (chunk data, window contents, entity
//! metadata) and the four-line sign update are framed elsewhere.

use super::schema::{SchemaError, SchemaResult, SchemaTable};
use super::string16::String16;
use super::types::{Direction, FieldType, PacketId};

crate::define_packets! {
    KeepAlive("keep_alive") = KeepAlive, Bidirectional {
        keep_alive_id: i32,
    }

    LoginRequestC2s("login_request_c2s") = LoginRequest, ClientToServer {
        protocol_ver: i32,
        username: String16,
        unused0: i64,
        unused1: i32,
        unused2: i8,
        unused3: i8,
        unused4: u8,
        unused5: u8,
    }

    LoginRequestS2c("login_request_s2c") = LoginRequest, ServerToClient {
        player_eid: i32,
        unused: String16,
        seed: i64,
        mode: i32,
        dimension: i8,
        difficulty: i8,
        world_height: u8,
        max_players: u8,
    }

    HandshakeC2s("handshake_c2s") = Handshake, ClientToServer {
        username: String16,
    }

    HandshakeS2c("handshake_s2c") = Handshake, ServerToClient {
        connection_hash: String16,
    }

    ChatMessage("chat_message") = ChatMsg, Bidirectional {
        msg: String16,
    }

    TimeUpdate("time_update") = UpdateTime, Bidirectional {
        time: i64,
    }

    EntEquipment("ent_equipment") = EntEquipment, Bidirectional {
        eid: i32,
        slot: i16,
        item_id: i16,
        damage: i16,
    }

    SpawnPos("spawn_pos") = SpawnPos, ServerToClient {
        x: i32,
        y: i32,
        z: i32,
    }

    EntUse("ent_use") = EntUse, Bidirectional {
        user: i32,
        target: i32,
        left_click: bool,
    }

    Health("health") = UpdateHealth, Bidirectional {
        health: i16,
        food: i16,
        food_saturation: f32,
    }

    /// Sent by client after hitting respawn
    /// Sent by server to change dimension or as a response to the client
    Respawn("respawn") = Respawn, Bidirectional {
        dimension: i8,
        difficulty: i8,
        mode: i8,
        world_height: i16,
        seed: i64,
    }

    OnGround("on_ground") = PlayerOnGround, ClientToServer {
        on_ground: bool,
    }

    PlayerPos("player_pos") = PlayerPos, ClientToServer {
        x: f64,
        y: f64,
        stance: f64,
        z: f64,
        on_ground: bool,
    }

    PlayerLook("player_look") = PlayerLook, ClientToServer {
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    }

    PlayerPosLookC2s("player_pos_look_c2s") = PlayerPosLook, ClientToServer {
        x: f64,
        y: f64,
        stance: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    }

    /// Stance and y are swapped compared to the client's version
    PlayerPosLookS2c("player_pos_look_s2c") = PlayerPosLook, ServerToClient {
        x: f64,
        stance: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    }

    PlayerDig("player_dig") = PlayerDig, Bidirectional {
        status: i8,
        x: i32,
        y: i8,
        z: i32,
        face: i8,
    }

    HoldChange("hold_change") = HoldChange, Bidirectional {
        slot_id: i16,
    }

    UseBed("use_bed") = UseBed, Bidirectional {
        eid: i32,
        in_bed: i8,
        headboard_x: i32,
        headboard_y: i8,
        headboard_z: i32,
    }

    EntAnimation("ent_animation") = EntAnimation, Bidirectional {
        eid: i32,
        animate: i8,
    }

    EntAction("ent_action") = EntAction, Bidirectional {
        eid: i32,
        action_id: i8,
    }

    EntSpawnNamed("ent_spawn_named") = EntSpawnNamed, Bidirectional {
        eid: i32,
        name: String16,
        x: i32,
        y: i32,
        z: i32,
        rotation: i8,
        pitch: i8,
        cur_item: i16,
    }

    EntSpawnPickup("ent_spawn_pickup") = EntSpawnPickup, Bidirectional {
        eid: i32,
        item: i16,
        count: i8,
        damage: i16,
        x: i32,
        y: i32,
        z: i32,
        rotation: i8,
        pitch: i8,
        roll: i8,
    }

    CollectItem("collect_item") = CollectItem, Bidirectional {
        collected_eid: i32,
        collector_eid: i32,
    }

    EntSpawnPainting("ent_spawn_painting") = EntSpawnPainting, Bidirectional {
        eid: i32,
        title: String16,
        center_x: i32,
        center_y: i32,
        center_z: i32,
        direction: i32,
    }

    EntSpawnXp("ent_spawn_xp") = EntSpawnXp, Bidirectional {
        eid: i32,
        x: i32,
        y: i32,
        z: i32,
        count: i16,
    }

    StanceUpdate("stance_update") = StanceUpdate, Bidirectional {
        unknown0: f32,
        unknown1: f32,
        unknown2: f32,
        unknown3: f32,
        unknown4: bool,
        unknown5: bool,
    }

    EntVelocity("ent_velocity") = EntVelocity, Bidirectional {
        eid: i32,
        vel_x: i32,
        vel_y: i32,
        vel_z: i32,
    }

    EntDestroy("ent_destroy") = EntDestroy, Bidirectional {
        eid: i32,
    }

    EntEnsureSpawn("ent_create") = EntEnsureSpawn, Bidirectional {
        eid: i32,
    }

    EntMoveRel("ent_move_rel") = EntMoveRel, Bidirectional {
        eid: i32,
        delta_x: i8,
        delta_y: i8,
        delta_z: i8,
    }

    EntLook("ent_look") = EntLook, Bidirectional {
        eid: i32,
        yaw: i8,
        pitch: i8,
    }

    EntLookMoveRel("ent_look_move_rel") = EntLookMoveRel, Bidirectional {
        eid: i32,
        delta_x: i8,
        delta_y: i8,
        delta_z: i8,
        yaw: i8,
        pitch: i8,
    }

    EntTeleport("ent_teleport") = EntMoveTeleport, Bidirectional {
        eid: i32,
        x: i32,
        y: i32,
        z: i32,
        rotation: i8,
        pitch: i8,
    }

    EntStatus("ent_status") = EntStatus, Bidirectional {
        eid: i32,
        status: i8,
    }

    EntAttach("ent_attach") = EntAttach, Bidirectional {
        eid: i32,
        vehicle: i32,
    }

    EntEffect("ent_effect") = EntEffect, Bidirectional {
        eid: i32,
        effect_id: i8,
        amplifier: i8,
        duration: i16,
    }

    EntEffectRemove("ent_effect_remove") = EntEffectRemove, Bidirectional {
        eid: i32,
        effect_id: i8,
    }

    XpSet("xp_set") = XpSet, Bidirectional {
        current_xp: i8,
        level: i8,
        total: i16,
    }

    ChunkCache("chunk_cache") = ChunkCache, Bidirectional {
        chunk_x: i32,
        chunk_z: i32,
        mode: bool,
    }

    BlockChange("block_change") = BlockChange, Bidirectional {
        block_x: i32,
        block_y: i8,
        block_z: i32,
        block_type: i8,
        metadata: i8,
    }

    SoundEffect("sound_effect") = Sfx, Bidirectional {
        effect_id: i32,
        x: i32,
        y: i8,
        z: i32,
        sound_data: i32,
    }

    NewState("new_state") = NewState, Bidirectional {
        reason: i8,
        mode: i8,
    }

    Thunderbolt("thunder") = Thunderbolt, Bidirectional {
        eid: i32,
        unknown: bool,
        x: i32,
        y: i32,
        z: i32,
    }

    WindowOpen("window_open") = WindowOpen, Bidirectional {
        window_id: i8,
        window_type: i8,
        title: String16,
        num_slots: i8,
    }

    WindowClose("window_close") = WindowClose, Bidirectional {
        window_id: i8,
    }

    WindowUpdateProgress("window_update_progress") = WindowUpdateProgress, ServerToClient {
        window_id: i8,
        progress: i16,
        value: i16,
    }

    WindowTransaction("window_transaction") = WindowTransaction, Bidirectional {
        window_id: i8,
        action_num: i16,
        accepted: bool,
    }

    InventoryActionCreative("inventory_action_creative") = InvCreativeAction, Bidirectional {
        slot: i16,
        item_id: i16,
        quantity: i16,
        damage: i16,
    }

    IncrementStatistic("increment_statistic") = IncrementStatistic, Bidirectional {
        stat_id: i32,
        amount: i8,
    }

    PlayerListItem("player_list_item") = PlayerListItem, Bidirectional {
        username: String16,
        online: bool,
        ping: i16,
    }

    ServerListPing("server_list_ping") = ServerListPing, Bidirectional {}

    Kick("kick") = Kick, Bidirectional {
        reason: String16,
    }
}

crate::packet_set! {
    /// Every packet a server frames and decodes.
    pub enum ServerboundPacket for Server {
        KeepAlive,
        LoginRequestC2s,
        HandshakeC2s,
        ChatMessage,
        TimeUpdate,
        EntEquipment,
        EntUse,
        Health,
        Respawn,
        OnGround,
        PlayerPos,
        PlayerLook,
        PlayerPosLookC2s,
        PlayerDig,
        HoldChange,
        UseBed,
        EntAnimation,
        EntAction,
        EntSpawnNamed,
        EntSpawnPickup,
        CollectItem,
        EntSpawnPainting,
        EntSpawnXp,
        StanceUpdate,
        EntVelocity,
        EntDestroy,
        EntEnsureSpawn,
        EntMoveRel,
        EntLook,
        EntLookMoveRel,
        EntTeleport,
        EntStatus,
        EntAttach,
        EntEffect,
        EntEffectRemove,
        XpSet,
        ChunkCache,
        BlockChange,
        SoundEffect,
        NewState,
        Thunderbolt,
        WindowOpen,
        WindowClose,
        WindowTransaction,
        InventoryActionCreative,
        IncrementStatistic,
        PlayerListItem,
        ServerListPing,
        Kick,
    }
}

crate::packet_set! {
    /// Every packet a client frames and decodes.
    pub enum ClientboundPacket for Client {
        KeepAlive,
        LoginRequestS2c,
        HandshakeS2c,
        ChatMessage,
        TimeUpdate,
        EntEquipment,
        SpawnPos,
        EntUse,
        Health,
        Respawn,
        PlayerPosLookS2c,
        PlayerDig,
        HoldChange,
        UseBed,
        EntAnimation,
        EntAction,
        EntSpawnNamed,
        EntSpawnPickup,
        CollectItem,
        EntSpawnPainting,
        EntSpawnXp,
        StanceUpdate,
        EntVelocity,
        EntDestroy,
        EntEnsureSpawn,
        EntMoveRel,
        EntLook,
        EntLookMoveRel,
        EntTeleport,
        EntStatus,
        EntAttach,
        EntEffect,
        EntEffectRemove,
        XpSet,
        ChunkCache,
        BlockChange,
        SoundEffect,
        NewState,
        Thunderbolt,
        WindowOpen,
        WindowClose,
        WindowUpdateProgress,
        WindowTransaction,
        InventoryActionCreative,
        IncrementStatistic,
        PlayerListItem,
        ServerListPing,
        Kick,
    }
}

/// Sign text is four String16 lines, which generic framing cannot measure.
const UPDATE_SIGN_FIELDS: &[(&str, FieldType)] = &[
    ("x", FieldType::Int),
    ("y", FieldType::Short),
    ("z", FieldType::Int),
    ("text0", FieldType::String16),
    ("text1", FieldType::String16),
    ("text2", FieldType::String16),
    ("text3", FieldType::String16),
];

impl SchemaTable {
    /// The table of every packet this crate knows.
    ///
    /// The sign update is offered too and ends up in
    /// [`SchemaTable::unsupported`].
    pub fn standard() -> SchemaResult<SchemaTable> {
        let mut builder = SchemaTable::builder();
        register_declared(&mut builder)?;

        match builder.register(
            "update_sign",
            PacketId::UpdateSign.id(),
            UPDATE_SIGN_FIELDS,
            Direction::Bidirectional,
            "",
        ) {
            Ok(()) | Err(SchemaError::UnsupportedSchema { .. }) => {}
            Err(e) => return Err(e),
        }

        Ok(builder.build())
    }
}
