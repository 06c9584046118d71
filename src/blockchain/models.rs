use serde_json::Value;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::system_program::ID as SYSTEM_PROGRAM_ID;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::parse_instruction::ParsedInstruction;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInstruction, UiMessage,
    UiParsedInstruction,
};
use tracing::warn;

/// Signature entry returned by "list signatures for address"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: String,
    pub block_time: Option<i64>,
}

impl From<RpcConfirmedTransactionStatusWithSignature> for SignatureInfo {
    fn from(status: RpcConfirmedTransactionStatusWithSignature) -> Self {
        Self {
            signature: status.signature,
            block_time: status.block_time,
        }
    }
}

/// The instruction shapes the bridge parser cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    SystemTransfer { lamports: u64 },
    CreateAccount,
    Other,
}

impl InstructionKind {
    pub fn transfer_lamports(&self) -> Option<u64> {
        match self {
            Self::SystemTransfer { lamports } => Some(*lamports),
            _ => None,
        }
    }
}

/// A fetched transaction reduced to what the parser needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub account_keys: Vec<String>,
    pub instructions: Vec<InstructionKind>,
    /// Nested instruction sets, one per top-level instruction that emitted any
    pub inner_instructions: Option<Vec<Vec<InstructionKind>>>,
    pub block_time: Option<i64>,
}

fn is_system_program(instruction: &ParsedInstruction) -> bool {
    instruction.program == "system" || instruction.program_id == SYSTEM_PROGRAM_ID.to_string()
}

fn lamports_of(parsed: &Value) -> Option<u64> {
    let lamports = parsed.get("info")?.get("lamports")?;
    lamports
        .as_u64()
        .or_else(|| lamports.as_str().and_then(|s| s.parse().ok()))
}

/// Decode one `jsonParsed` instruction into its tagged shape
pub fn decode_instruction(instruction: &UiInstruction) -> InstructionKind {
    let parsed = match instruction {
        UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) if is_system_program(parsed) => {
            parsed
        }
        _ => return InstructionKind::Other,
    };

    match parsed.parsed.get("type").and_then(Value::as_str) {
        Some("transfer") => match lamports_of(&parsed.parsed) {
            Some(lamports) => InstructionKind::SystemTransfer { lamports },
            None => InstructionKind::Other,
        },
        Some("createAccount") => InstructionKind::CreateAccount,
        _ => InstructionKind::Other,
    }
}

/// Reduce an RPC transaction fetched with `jsonParsed` encoding
pub fn extract_parsed_transaction(
    signature: &str,
    tx_data: &EncodedConfirmedTransactionWithStatusMeta,
) -> Option<ParsedTransaction> {
    let transaction = match &tx_data.transaction.transaction {
        EncodedTransaction::Json(tx) => tx,
        _ => {
            warn!("Unsupported transaction encoding for {}", signature);
            return None;
        }
    };

    let message = match &transaction.message {
        UiMessage::Parsed(message) => message,
        UiMessage::Raw(_) => {
            warn!("Transaction {} has unparsed message", signature);
            return None;
        }
    };

    let account_keys = message
        .account_keys
        .iter()
        .map(|account| account.pubkey.clone())
        .collect();
    let instructions = message.instructions.iter().map(decode_instruction).collect();

    let inner_instructions = tx_data.transaction.meta.as_ref().and_then(|meta| {
        match &meta.inner_instructions {
            OptionSerializer::Some(sets) => Some(
                sets.iter()
                    .map(|set| set.instructions.iter().map(decode_instruction).collect())
                    .collect(),
            ),
            _ => None,
        }
    });

    Some(ParsedTransaction {
        account_keys,
        instructions,
        inner_instructions,
        block_time: tx_data.block_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(program: &str, parsed: Value) -> UiInstruction {
        UiInstruction::Parsed(UiParsedInstruction::Parsed(ParsedInstruction {
            program: program.to_string(),
            program_id: if program == "system" {
                SYSTEM_PROGRAM_ID.to_string()
            } else {
                "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".to_string()
            },
            parsed,
            stack_height: None,
        }))
    }

    #[test]
    fn decodes_system_transfer() {
        let ix = parsed(
            "system",
            json!({
                "type": "transfer",
                "info": {"source": "a", "destination": "b", "lamports": 42}
            }),
        );
        assert_eq!(decode_instruction(&ix), InstructionKind::SystemTransfer { lamports: 42 });
    }

    #[test]
    fn decodes_create_account() {
        let ix = parsed(
            "system",
            json!({"type": "createAccount", "info": {"lamports": 890880, "space": 0}}),
        );
        assert_eq!(decode_instruction(&ix), InstructionKind::CreateAccount);
    }

    #[test]
    fn token_transfer_is_other() {
        let ix = parsed(
            "spl-token",
            json!({"type": "transfer", "info": {"amount": "10"}}),
        );
        assert_eq!(decode_instruction(&ix), InstructionKind::Other);
    }

    #[test]
    fn transfer_without_lamports_is_other() {
        let ix = parsed("system", json!({"type": "transfer", "info": {}}));
        assert_eq!(decode_instruction(&ix), InstructionKind::Other);
    }
}
