//! Text, table and JSON rendering for schemas and decoded frames

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::{json, Value};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use b181_protocol::protocol::{
    describe_frame, DynamicRecord, FieldType, FieldValue, PacketSchema, SchemaTable, Side,
    String16,
};

#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "ID")]
    opcode: String,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Length")]
    length: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Width")]
    width: String,
}

/// `5` for fixed frames, `3+` for frames with a String16.
fn length_label(schema: &PacketSchema) -> String {
    match schema.fixed_frame_len() {
        Some(len) => len.to_string(),
        None => format!("{}+", schema.min_frame_len()),
    }
}

pub fn schema_table(schemas: &[&PacketSchema]) -> String {
    let rows = schemas.iter().map(|s| SchemaRow {
        opcode: format!("0x{:02x}", s.opcode()),
        name: s.name(),
        direction: s.direction().to_string(),
        length: length_label(s),
        fields: s
            .fields()
            .iter()
            .map(|f| format!("{}: {}", f.name, f.field_type))
            .collect::<Vec<_>>()
            .join(", "),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn schema_detail(schema: &PacketSchema) -> String {
    let mut out = format!(
        "{}\n",
        format!("{} (0x{:02x})", schema.name(), schema.opcode())
            .bold()
            .underline()
    );
    if !schema.doc().is_empty() {
        out.push_str(&format!("  {}\n", schema.doc()));
    }
    out.push_str(&format!("  Direction: {}\n", schema.direction()));
    out.push_str(&format!("  Length:    {}\n", length_label(schema)));

    if schema.fields().is_empty() {
        out.push_str(&format!("  {}\n", "No fields".yellow()));
        return out;
    }

    let rows = schema.fields().iter().map(|f| FieldRow {
        position: f.position,
        name: f.name,
        field_type: f.field_type.to_string(),
        width: match f.field_type.fixed_width() {
            Some(width) => width.to_string(),
            None => "2+2n".to_string(),
        },
    });
    out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    out.push('\n');
    out
}

pub fn schema_json(schema: &PacketSchema) -> Value {
    let fields: Vec<Value> = schema
        .fields()
        .iter()
        .map(|f| json!({ "name": f.name, "type": f.field_type.name() }))
        .collect();
    json!({
        "name": schema.name(),
        "opcode": schema.opcode(),
        "direction": schema.direction().to_string(),
        "min_len": schema.min_frame_len(),
        "fixed_len": schema.fixed_frame_len(),
        "doc": schema.doc(),
        "fields": fields,
    })
}

pub fn value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(v) => json!(v),
        FieldValue::Byte(v) => json!(v),
        FieldValue::UByte(v) => json!(v),
        FieldValue::Short(v) => json!(v),
        FieldValue::Int(v) => json!(v),
        FieldValue::Long(v) => json!(v),
        FieldValue::Float(v) => json!(v),
        FieldValue::Double(v) => json!(v),
        FieldValue::String16(v) => json!(v.to_string_lossy()),
    }
}

pub fn record_json(record: &DynamicRecord) -> Value {
    let fields: serde_json::Map<String, Value> = record
        .fields
        .iter()
        .map(|(name, value)| (name.to_string(), value_json(value)))
        .collect();
    json!({
        "name": record.name,
        "opcode": record.opcode,
        "fields": fields,
    })
}

/// One decoded frame, or its error and bytes.
pub fn frame_json(table: &SchemaTable, side: Side, frame: &[u8]) -> Value {
    let opcode = frame.first().copied().unwrap_or_default();
    let result = table
        .lookup(opcode, side)
        .map(|schema| schema.decode_record(frame));

    match result {
        Some(Ok(record)) => record_json(&record),
        Some(Err(e)) => json!({ "opcode": opcode, "error": e.to_string(), "hex": hex::encode(frame) }),
        None => json!({ "opcode": opcode, "error": "no schema", "hex": hex::encode(frame) }),
    }
}

pub fn frame_line(table: &SchemaTable, side: Side, frame: &[u8]) -> String {
    format!(
        "{} {}",
        format!("[{:>4}]", frame.len()).dimmed(),
        describe_frame(table, side, frame)
    )
}

/// Decode hex input, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    hex::decode(cleaned).context("Input is not valid hex")
}

/// Parse a command line value as the given field type.
pub fn parse_value(field_type: FieldType, text: &str) -> Result<FieldValue> {
    Ok(match field_type {
        FieldType::Bool => match text {
            "true" | "1" => FieldValue::Bool(true),
            "false" | "0" => FieldValue::Bool(false),
            other => bail!("expected true or false, got {}", other),
        },
        FieldType::Byte => FieldValue::Byte(text.parse()?),
        FieldType::UByte => FieldValue::UByte(text.parse()?),
        FieldType::Short => FieldValue::Short(text.parse()?),
        FieldType::Int => FieldValue::Int(text.parse()?),
        FieldType::Long => FieldValue::Long(text.parse()?),
        FieldType::Float => FieldValue::Float(text.parse()?),
        FieldType::Double => FieldValue::Double(text.parse()?),
        FieldType::String16 => {
            if text.encode_utf16().count() > String16::MAX_UNITS {
                bail!("text is longer than {} characters", String16::MAX_UNITS);
            }
            FieldValue::String16(String16::from(text))
        }
    })
}
