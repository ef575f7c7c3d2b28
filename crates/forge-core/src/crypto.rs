//! BLS12-381 aggregation and verification, used by the attestation (C4) and
//! sync-contribution (C5) pipelines. This is the one place the core talks
//! to `blst` directly; everything else works with opaque `BlsSignature` /
//! `BlsPubkey` byte wrappers.

use blst::min_pk::{AggregatePublicKey, AggregateSignature, PublicKey, Signature};
use blst::BLST_ERROR;

use crate::error::CoreError;
use crate::types::{BlsPubkey, BlsSignature};

const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSZ_RO_POP_";

/// Aggregate a non-empty set of signatures into one. Returns the infinity
/// signature for an empty input (spec §3.3's "or the infinity signature if
/// none selected").
pub fn aggregate_signatures(sigs: &[BlsSignature]) -> Result<BlsSignature, CoreError> {
    if sigs.is_empty() {
        return Ok(BlsSignature::infinity());
    }
    let parsed: Result<Vec<Signature>, _> = sigs
        .iter()
        .map(|s| Signature::from_bytes(&s.0))
        .collect();
    let parsed = parsed.map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    let refs: Vec<&Signature> = parsed.iter().collect();
    let agg = AggregateSignature::aggregate(&refs, true)
        .map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    let compressed = agg.to_signature().to_bytes();
    BlsSignature::from_bytes(&compressed).map_err(|e| CoreError::CryptoFailure(e.to_string()))
}

/// Aggregate a non-empty set of public keys, e.g. the participating
/// committee members behind one attestation's aggregation bits.
pub fn aggregate_pubkeys(pubkeys: &[BlsPubkey]) -> Result<BlsPubkey, CoreError> {
    if pubkeys.is_empty() {
        return Err(CoreError::InvalidArgument("cannot aggregate zero public keys".into()));
    }
    let parsed: Result<Vec<PublicKey>, _> = pubkeys.iter().map(|pk| PublicKey::from_bytes(&pk.0)).collect();
    let parsed = parsed.map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    let refs: Vec<&PublicKey> = parsed.iter().collect();
    let agg = AggregatePublicKey::aggregate(&refs, false).map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    BlsPubkey::from_bytes(&agg.to_public_key().to_bytes()).map_err(|e| CoreError::CryptoFailure(e.to_string()))
}

/// Batch-verify a set of (pubkey, message, signature) triples: combine the
/// (still-distinct) signatures into one aggregate, then check it against
/// the batch's distinct `(pubkey, message)` pairs in a single pairing via
/// `aggregate_verify`. All-or-nothing — the caller, `forge-node`, is
/// responsible for falling back to per-item verification on failure, per
/// spec §4.4.8.
pub fn batch_verify(items: &[(&BlsPubkey, &[u8], &BlsSignature)]) -> Result<bool, CoreError> {
    if items.is_empty() {
        return Ok(true);
    }

    let mut pks = Vec::with_capacity(items.len());
    let mut sigs = Vec::with_capacity(items.len());
    let mut msgs: Vec<&[u8]> = Vec::with_capacity(items.len());
    for (pk, msg, sig) in items {
        pks.push(PublicKey::from_bytes(&pk.0).map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?);
        sigs.push(Signature::from_bytes(&sig.0).map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?);
        msgs.push(*msg);
    }

    let sig_refs: Vec<&Signature> = sigs.iter().collect();
    let combined = AggregateSignature::aggregate(&sig_refs, true)
        .map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?
        .to_signature();

    let pk_refs: Vec<&PublicKey> = pks.iter().collect();
    let result = combined.aggregate_verify(true, &msgs, DST, &pk_refs, false);
    Ok(result == BLST_ERROR::BLST_SUCCESS)
}

/// Verify a single (pubkey, message, signature) triple.
pub fn verify_one(pk: &BlsPubkey, msg: &[u8], sig: &BlsSignature) -> Result<bool, CoreError> {
    let pk = PublicKey::from_bytes(&pk.0).map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    let sig = Signature::from_bytes(&sig.0).map_err(|e| CoreError::CryptoFailure(format!("{e:?}")))?;
    let result = sig.verify(true, msg, DST, &[], &pk, true);
    Ok(result == BLST_ERROR::BLST_SUCCESS)
}
