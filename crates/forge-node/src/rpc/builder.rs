//! MEV-boost-style relay client: `GET /eth/v1/builder/header/{slot}/{parent_hash}/{pubkey}`.
//! Only the fields `forge_core::types::BuilderBid` tracks are parsed out of
//! the relay's response; everything else in the real builder-API schema
//! (extra execution-payload-header fields this core treats as opaque) is
//! ignored.

use async_trait::async_trait;
use forge_core::types::{BlsPubkey, BlsSignature, BuilderBid, ExecutionPayloadHeader, Root, SignedBuilderBid, Slot};
use serde_json::Value;

use crate::collaborators::BlockBuilder;
use crate::error::ProposerError;

use super::{decode_hex_bytes, decode_hex_u64, decode_root_field, hex_bytes};

pub struct BuilderApiClient {
    http: reqwest::Client,
    relay_base_url: String,
}

impl BuilderApiClient {
    pub fn new(relay_base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), relay_base_url: relay_base_url.into() }
    }
}

#[async_trait]
impl BlockBuilder for BuilderApiClient {
    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: Root,
        validator_pubkey: BlsPubkey,
    ) -> Result<SignedBuilderBid, ProposerError> {
        let url = format!(
            "{}/eth/v1/builder/header/{}/{}/{}",
            self.relay_base_url.trim_end_matches('/'),
            slot,
            parent_hash,
            hex_bytes(&validator_pubkey.0),
        );

        let response: Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ProposerError::BuilderError { reason: format!("request failed: {e}") })?
            .json()
            .await
            .map_err(|e| ProposerError::BuilderError { reason: format!("response not JSON: {e}") })?;

        let data = response.get("data").ok_or_else(|| ProposerError::BuilderError {
            reason: "response missing \"data\"".into(),
        })?;

        decode_signed_bid(data).map_err(|e| ProposerError::BuilderError { reason: format!("malformed bid: {e}") })
    }
}

fn decode_signed_bid(data: &Value) -> Result<SignedBuilderBid, anyhow::Error> {
    let message = data.get("message").ok_or_else(|| anyhow::anyhow!("missing message"))?;
    let header_json = message.get("header").ok_or_else(|| anyhow::anyhow!("missing header"))?;

    let header = ExecutionPayloadHeader {
        parent_hash: decode_root_field(header_json, "parent_hash")?,
        block_hash: decode_root_field(header_json, "block_hash")?,
        fee_recipient: decode_fee_recipient(header_json)?,
        timestamp: decode_hex_u64(
            header_json.get("timestamp").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing timestamp"))?,
        )?,
        transactions_root: decode_root_field(header_json, "transactions_root")?,
        withdrawals_root: decode_root_field(header_json, "withdrawals_root")
            .unwrap_or(Root::zero()),
        blob_gas_used: header_json.get("blob_gas_used").and_then(Value::as_str).map(decode_hex_u64).transpose()?,
        excess_blob_gas: header_json.get("excess_blob_gas").and_then(Value::as_str).map(decode_hex_u64).transpose()?,
    };

    let value_wei_str = message.get("value").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing value"))?;
    let value_wei = alloy_primitives::U256::from_str_radix(value_wei_str, 10)
        .or_else(|_| alloy_primitives::U256::from_str_radix(value_wei_str.trim_start_matches("0x"), 16))
        .map_err(|e| anyhow::anyhow!("malformed value: {e}"))?;

    let pubkey_hex = message.get("pubkey").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing pubkey"))?;
    let pubkey_bytes = decode_hex_bytes(pubkey_hex)?;
    let pubkey = BlsPubkey::from_bytes(&pubkey_bytes).map_err(|e| anyhow::anyhow!(e))?;

    let blob_kzg_commitments = message
        .get("blob_kzg_commitments")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    let s = entry.as_str().ok_or_else(|| anyhow::anyhow!("kzg commitment not a string"))?;
                    let bytes = decode_hex_bytes(s)?;
                    if bytes.len() != 48 {
                        anyhow::bail!("kzg commitment must be 48 bytes");
                    }
                    let mut arr = [0u8; 48];
                    arr.copy_from_slice(&bytes);
                    Ok(arr)
                })
                .collect::<Result<Vec<_>, anyhow::Error>>()
        })
        .transpose()?;

    let signature_hex = data.get("signature").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing signature"))?;
    let signature_bytes = decode_hex_bytes(signature_hex)?;
    let signature = BlsSignature::from_bytes(&signature_bytes).map_err(|e| anyhow::anyhow!(e))?;

    Ok(SignedBuilderBid {
        bid: BuilderBid { header, value_wei, pubkey, blob_kzg_commitments },
        signature,
    })
}

fn decode_fee_recipient(header_json: &Value) -> Result<[u8; 20], anyhow::Error> {
    let hex_value = header_json
        .get("fee_recipient")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing fee_recipient"))?;
    let bytes = decode_hex_bytes(hex_value)?;
    if bytes.len() != 20 {
        anyhow::bail!("fee_recipient must be 20 bytes");
    }
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
