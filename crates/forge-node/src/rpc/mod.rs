//! Reference HTTP collaborator implementations: an engine-API client for
//! [`crate::collaborators::ExecutionEngine`] and a builder-relay client for
//! [`crate::collaborators::BlockBuilder`]. A production node is free to
//! swap these for its own (spec §1: the wire protocols on either side of
//! these traits are out of scope), but a real implementation beats a bare
//! trait definition with nothing behind it.

pub mod builder;
pub mod engine;

use forge_core::types::Root;
use serde_json::Value;

fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn hex_u64(value: u64) -> String {
    format!("0x{value:x}")
}

fn decode_hex_bytes(s: &str) -> Result<Vec<u8>, anyhow::Error> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

fn decode_hex_u64(s: &str) -> Result<u64, anyhow::Error> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(u64::from_str_radix(s, 16)?)
}

fn decode_root_field(value: &Value, field: &str) -> Result<Root, anyhow::Error> {
    let s = value.get(field).and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing {field}"))?;
    let bytes = decode_hex_bytes(s)?;
    Root::from_bytes(&bytes).map_err(|e| anyhow::anyhow!(e))
}
