use serde::{Deserialize, Serialize};

use crate::monitoring::ContractSet;

pub const PERPETUAL_CONTRACT_TYPE: &str = "PERPETUAL";

/// Subset of `GET /fapi/v1/exchangeInfo` the monitor reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
}

impl SymbolInfo {
    pub fn is_perpetual(&self) -> bool {
        self.contract_type == PERPETUAL_CONTRACT_TYPE
    }
}

impl ExchangeInfo {
    pub fn perpetual_symbols(&self) -> ContractSet {
        self.symbols
            .iter()
            .filter(|s| s.is_perpetual())
            .map(|s| s.symbol.clone())
            .collect()
    }
}

/// Lark/Feishu custom-bot text message.
#[derive(Debug, Clone, Serialize)]
pub struct LarkTextMessage<'a> {
    pub msg_type: &'static str,
    pub content: LarkTextContent<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LarkTextContent<'a> {
    pub text: &'a str,
}

impl<'a> LarkTextMessage<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            msg_type: "text",
            content: LarkTextContent { text },
        }
    }
}
