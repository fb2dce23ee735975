//! Packet tool CLI
//!
//! Lists the packet schemas of the Minecraft beta 1.8.1 codec, splits and
//! decodes captured byte streams, and builds frames from field values.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use b181_protocol::protocol::{PacketFramer, SchemaTable, Side};

mod render;

#[derive(Parser)]
#[command(name = "packet_tool")]
#[command(version = "1.0.0")]
#[command(about = "Inspect Minecraft beta 1.8.1 packet schemas and frames", long_about = None)]
struct Cli {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List packet schemas
    Schemas {
        /// Only show packets received by this side
        #[arg(short, long)]
        side: Option<SideArg>,
    },
    /// Show the field layout of one packet
    Show {
        /// Schema name, e.g. login_request_c2s
        name: String,
    },
    /// Split a hex byte stream into frames and decode them
    Decode {
        /// Side receiving the bytes
        #[arg(short, long, default_value = "server")]
        side: SideArg,
        /// Hex bytes; whitespace is ignored
        bytes: Vec<String>,
    },
    /// Encode a packet from field=value pairs
    Encode {
        /// Schema name, e.g. chat_message
        name: String,
        /// Field assignments; unset fields keep their defaults
        fields: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Server,
    Client,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Server => Side::Server,
            SideArg::Client => Side::Client,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json_output = cli.format == "json";

    let table = SchemaTable::standard().context("Failed to build schema table")?;

    match cli.command {
        Commands::Schemas { side } => list_schemas(&table, side.map(Side::from), json_output)?,
        Commands::Show { name } => {
            let schema = table
                .find_by_name(&name)
                .with_context(|| format!("No packet named {}", name))?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&render::schema_json(schema))?);
            } else {
                print!("{}", render::schema_detail(schema));
            }
        }
        Commands::Decode { side, bytes } => {
            decode_stream(table, side.into(), &bytes.concat(), json_output)?
        }
        Commands::Encode { name, fields } => encode_packet(&table, &name, &fields, json_output)?,
    }

    Ok(())
}

fn list_schemas(table: &SchemaTable, side: Option<Side>, json: bool) -> Result<()> {
    let schemas: Vec<_> = match side {
        Some(side) => table.received_by(side).collect(),
        None => table.iter().collect(),
    };

    if json {
        let list: Vec<_> = schemas.iter().map(|s| render::schema_json(s)).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{}", render::schema_table(&schemas));
    println!("{} schema(s)", schemas.len().to_string().green());
    for unsupported in table.unsupported() {
        println!(
            "{} {} (0x{:02x}, {}): {} String16 fields",
            "Excluded:".yellow(),
            unsupported.name,
            unsupported.opcode,
            unsupported.direction,
            unsupported.variable_fields
        );
    }
    Ok(())
}

fn decode_stream(table: SchemaTable, side: Side, input: &str, json: bool) -> Result<()> {
    let bytes = render::parse_hex(input)?;
    let table = Arc::new(table);
    let mut framer = PacketFramer::with_max_frame_len(table.clone(), side, usize::MAX);
    framer.extend(&bytes);

    let mut records = Vec::new();
    loop {
        let frame = match framer.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
                bail!("{} ({} byte(s) left)", e, framer.buffered());
            }
        };

        if json {
            records.push(render::frame_json(&table, side, &frame));
        } else {
            println!("{}", render::frame_line(&table, side, &frame));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }
    if framer.buffered() > 0 {
        let wanted = match framer.bytes_wanted() {
            Some(n) => format!("{} more byte(s) needed", n),
            None => "length not yet known".to_string(),
        };
        eprintln!(
            "{} {} byte(s) of an incomplete frame, {}",
            "Note:".yellow(),
            framer.buffered(),
            wanted
        );
    }
    Ok(())
}

fn encode_packet(table: &SchemaTable, name: &str, fields: &[String], json: bool) -> Result<()> {
    let schema = table
        .find_by_name(name)
        .with_context(|| format!("No packet named {}", name))?;

    let mut record = schema.default_record();
    for assignment in fields {
        let (field, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected field=value, got {}", assignment))?;
        let spec = schema
            .field(field)
            .with_context(|| format!("{} has no field {}", schema.name(), field))?;
        let value = render::parse_value(spec.field_type, value)
            .with_context(|| format!("Bad value for {}", field))?;
        record.set(field, value);
    }

    let frame = schema.encode_record(&record);
    if json {
        let mut out = render::record_json(&record);
        out["hex"] = serde_json::Value::String(hex::encode(&frame));
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", record);
        println!("{}", hex::encode(&frame).bold());
    }
    Ok(())
}
