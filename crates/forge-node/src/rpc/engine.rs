//! `engine_forkchoiceUpdatedVx` / `engine_getPayloadVx` client, selecting the
//! JSON-RPC method version from the target slot's fork the same way
//! [`forge_core::types::ChainSpec::fork_version_at`] does for signing
//! domains.

use async_trait::async_trait;
use forge_core::types::{ChainSpec, Root, Slot};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::collaborators::{ExecutionEngine, LocalPayloadResult, PayloadId};
use crate::error::ProposerError;

use super::{decode_hex_bytes, decode_hex_u64, decode_root_field, hex_bytes, hex_u64};

pub struct EngineApiClient {
    http: reqwest::Client,
    endpoint: String,
    /// Pre-minted JWT bearer token (HS256 over the shared engine-API
    /// secret); the embedding node is responsible for rotating it, this
    /// client just attaches whatever it's handed.
    jwt: Option<String>,
    spec: ChainSpec,
}

impl EngineApiClient {
    pub fn new(endpoint: impl Into<String>, jwt: Option<String>, spec: ChainSpec) -> Self {
        Self { http: reqwest::Client::new(), endpoint: endpoint.into(), jwt, spec }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ProposerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.jwt {
            request = request.bearer_auth(token);
        }

        let response: JsonRpcResponse = request
            .send()
            .await
            .map_err(|e| ProposerError::EngineError(format!("{method} request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ProposerError::EngineError(format!("{method} response not JSON: {e}")))?;

        if let Some(error) = response.error {
            return Err(ProposerError::EngineError(format!("{method} returned error: {}", error.message)));
        }
        response
            .result
            .ok_or_else(|| ProposerError::EngineError(format!("{method} returned neither result nor error")))
    }
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    message: String,
}

#[async_trait]
impl ExecutionEngine for EngineApiClient {
    async fn get_payload_id(
        &self,
        parent_hash: Root,
        timestamp: u64,
        prev_randao: Root,
        fee_recipient: [u8; 20],
    ) -> Result<PayloadId, ProposerError> {
        let forkchoice_state = json!({
            "headBlockHash": parent_hash.to_string(),
            "safeBlockHash": parent_hash.to_string(),
            "finalizedBlockHash": parent_hash.to_string(),
        });
        let payload_attributes = json!({
            "timestamp": hex_u64(timestamp),
            "prevRandao": prev_randao.to_string(),
            "suggestedFeeRecipient": hex_bytes(&fee_recipient),
        });

        let result = self
            .call("engine_forkchoiceUpdatedV3", json!([forkchoice_state, payload_attributes]))
            .await?;

        let payload_id_hex = result
            .get("payloadId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProposerError::EngineError("forkchoiceUpdated returned no payloadId".into()))?;

        let bytes = decode_hex_bytes(payload_id_hex)
            .map_err(|e| ProposerError::EngineError(format!("malformed payloadId: {e}")))?;
        if bytes.len() != 8 {
            return Err(ProposerError::EngineError(format!("payloadId must be 8 bytes, got {}", bytes.len())));
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes);
        Ok(PayloadId(id))
    }

    async fn get_payload(&self, payload_id: PayloadId, slot: Slot) -> Result<LocalPayloadResult, ProposerError> {
        let method = if self.spec.is_post_deneb(slot) {
            "engine_getPayloadV3"
        } else if self.spec.is_post_capella(slot) {
            "engine_getPayloadV2"
        } else {
            "engine_getPayloadV1"
        };

        let id_hex = hex_bytes(&payload_id.0);
        let result = self.call(method, json!([id_hex])).await?;

        let payload_json = result
            .get("executionPayload")
            .cloned()
            .unwrap_or_else(|| result.clone());

        let payload = decode_execution_payload(&payload_json)
            .map_err(|e| ProposerError::EngineError(format!("malformed executionPayload: {e}")))?;

        let value_wei = result
            .get("blockValue")
            .and_then(Value::as_str)
            .map(|hex_value| {
                alloy_primitives::U256::from_str_radix(hex_value.trim_start_matches("0x"), 16)
                    .map_err(|e| ProposerError::EngineError(format!("malformed blockValue: {e}")))
            })
            .transpose()?
            .unwrap_or(alloy_primitives::U256::ZERO);

        let blobs_bundle = result.get("blobsBundle").map(decode_blobs_bundle).transpose().map_err(|e| {
            ProposerError::EngineError(format!("malformed blobsBundle: {e}"))
        })?;

        let override_builder = result
            .get("shouldOverrideBuilder")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(LocalPayloadResult { payload, value_wei, blobs_bundle, override_builder })
    }
}

fn decode_execution_payload(value: &Value) -> Result<forge_core::types::ExecutionPayload, anyhow::Error> {
    let fee_recipient_hex = value
        .get("feeRecipient")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing feeRecipient"))?;
    let fee_recipient_bytes = decode_hex_bytes(fee_recipient_hex)?;
    if fee_recipient_bytes.len() != 20 {
        anyhow::bail!("feeRecipient must be 20 bytes");
    }
    let mut fee_recipient = [0u8; 20];
    fee_recipient.copy_from_slice(&fee_recipient_bytes);

    Ok(forge_core::types::ExecutionPayload {
        parent_hash: decode_root_field(value, "parentHash")?,
        block_hash: decode_root_field(value, "blockHash")?,
        fee_recipient,
        timestamp: decode_hex_u64(
            value.get("timestamp").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing timestamp"))?,
        )?,
        transactions_root: decode_root_field(value, "transactionsRoot")?,
        withdrawals_root: decode_root_field(value, "withdrawalsRoot")?,
        blob_gas_used: value
            .get("blobGasUsed")
            .and_then(Value::as_str)
            .map(decode_hex_u64)
            .transpose()?,
        excess_blob_gas: value
            .get("excessBlobGas")
            .and_then(Value::as_str)
            .map(decode_hex_u64)
            .transpose()?,
    })
}

fn decode_blobs_bundle(value: &Value) -> Result<forge_core::types::BlobsBundle, anyhow::Error> {
    let decode_fixed_list = |field: &str| -> Result<Vec<[u8; 48]>, anyhow::Error> {
        value
            .get(field)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow::anyhow!("missing {field}"))?
            .iter()
            .map(|entry| {
                let s = entry.as_str().ok_or_else(|| anyhow::anyhow!("{field} entry not a string"))?;
                let bytes = decode_hex_bytes(s)?;
                if bytes.len() != 48 {
                    anyhow::bail!("{field} entry must be 48 bytes");
                }
                let mut arr = [0u8; 48];
                arr.copy_from_slice(&bytes);
                Ok(arr)
            })
            .collect()
    };

    let blobs = value
        .get("blobs")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("missing blobs"))?
        .iter()
        .map(|entry| entry.as_str().ok_or_else(|| anyhow::anyhow!("blobs entry not a string")).and_then(decode_hex_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(forge_core::types::BlobsBundle {
        commitments: decode_fixed_list("commitments")?,
        proofs: decode_fixed_list("proofs")?,
        blobs,
    })
}
