//! Request extraction.
//!
//! A transaction is a cross-chain request when it invokes
//! `ChainCodeInvoke(from, to, txId, stepId, payload, signer)` on the routing
//! contract. Anything else is ordinary ledger traffic and yields `None`.

use crate::domain::errors::ExtractError;
use shared_types::{
    CrossChainMessage, CrossChainRequest, Envelope, RawBlock, TxOrigin, FN_CHAINCODE_INVOKE,
};

/// Argument count of a `ChainCodeInvoke` envelope, function name included.
pub const CHAINCODE_INVOKE_ARGS: usize = 7;

/// Decode `envelope` (found in `block`) into a cross-chain message.
pub fn extract(envelope: &Envelope, block: &RawBlock) -> Result<Option<CrossChainMessage>, ExtractError> {
    let Some(tx_hash) = envelope.tx_hash.as_deref().filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    let Some(function) = envelope.function() else {
        return Ok(None);
    };

    if function == FN_CHAINCODE_INVOKE.as_bytes() {
        decode_invoke(tx_hash, envelope, block).map(|request| Some(CrossChainMessage::Invoke(request)))
    } else {
        Ok(None)
    }
}

fn decode_invoke(tx_hash: &str, envelope: &Envelope, block: &RawBlock) -> Result<CrossChainRequest, ExtractError> {
    let args = &envelope.args;
    if args.len() != CHAINCODE_INVOKE_ARGS {
        return Err(ExtractError::WrongArgCount {
            function: FN_CHAINCODE_INVOKE,
            expected: CHAINCODE_INVOKE_ARGS,
            actual: args.len(),
        });
    }

    let from = required_text(&args[1], "from")?;
    let to = required_text(&args[2], "to")?;
    let transaction_id = required_text(&args[3], "transaction_id")?;
    let step_id = text(&args[4], "step_id")?;

    Ok(CrossChainRequest {
        from: from.into(),
        to: to.into(),
        transaction_id,
        step_id,
        payload: args[5].clone(),
        signer: args[6].clone(),
        timestamp: 0,
        origin: TxOrigin {
            tx_hash: tx_hash.to_string(),
            block_number: block.number,
            block_hash: block.hash.clone(),
            raw: envelope.raw.clone(),
        },
    })
}

fn text(bytes: &[u8], field: &'static str) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidUtf8 { field })
}

fn required_text(bytes: &[u8], field: &'static str) -> Result<String, ExtractError> {
    let value = text(bytes, field)?;
    if value.is_empty() {
        return Err(ExtractError::EmptyField { field });
    }
    Ok(value)
}
