//! 출력 형식

use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// 단일 값 출력 (json: `{"<field>": value}`)
    pub fn scalar(&self, field: &str, value: &str) -> String {
        match self {
            OutputFormat::Text => value.to_string(),
            OutputFormat::Json => serde_json::json!({ field: value }).to_string(),
        }
    }

    /// 구조화된 값 출력 (text: 들여쓴 JSON)
    pub fn document(&self, value: &Value) -> String {
        match self {
            OutputFormat::Text => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            OutputFormat::Json => value.to_string(),
        }
    }
}
