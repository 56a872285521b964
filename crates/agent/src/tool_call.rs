//! Textual tool-call extraction
//!
//! The model embeds at most one call per reply as
//! `[<name>{<python-literal-mapping>}]`, optionally wrapped in
//! `<TOOLCALL>...</TOOLCALL>`. The wrapper is not required: the whole reply
//! is searched and the leftmost call wins.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::literal::parse_literal_prefix;

/// A call the model asked for
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCall {
    pub name: String,
    pub payload: Value,
}

/// Outcome of scanning one model reply
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallParse {
    /// No `[name{` opener anywhere in the reply
    NoCall,
    Call(ParsedToolCall),
    /// An opener was found but the call could not be read
    Malformed { name: String, reason: String },
}

impl ToolCallParse {
    pub fn is_call(&self) -> bool {
        matches!(self, ToolCallParse::Call(_))
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            ToolCallParse::Call(call) => Some(&call.name),
            ToolCallParse::Malformed { name, .. } => Some(name),
            ToolCallParse::NoCall => None,
        }
    }
}

fn opener() -> &'static Regex {
    static OPENER: OnceLock<Regex> = OnceLock::new();
    OPENER.get_or_init(|| Regex::new(r"\[([A-Za-z0-9_-]+)\{").unwrap())
}

/// Extract the leftmost tool call from a model reply
pub fn extract_tool_call(content: &str) -> ToolCallParse {
    let Some(caps) = opener().captures(content) else {
        return ToolCallParse::NoCall;
    };
    let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
        return ToolCallParse::NoCall;
    };
    let name = name.as_str().to_string();

    // the mapping starts at the brace that closes the opener match
    let brace = whole.end() - 1;
    let literal = &content[brace..];

    let (payload, used) = match parse_literal_prefix(literal) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ToolCallParse::Malformed {
                name,
                reason: e.to_string(),
            }
        }
    };

    let after = literal[used..].trim_start();
    if !after.starts_with(']') {
        return ToolCallParse::Malformed {
            name,
            reason: "call is not closed with `]`".to_string(),
        };
    }

    ToolCallParse::Call(ParsedToolCall { name, payload })
}
