//! Decoder seam for the persisted smart-collection blob. Lightroom
//! serializes a smart collection's criteria tree as a Lua table literal;
//! parsing that byte format is a separate concern, so this module only
//! defines the contract the `smart_collection` translator consumes — a
//! recursive structure of integer-indexed children and
//! string/number/boolean leaves — plus a `DecodeError` for malformed input.

use thiserror::Error;

/// The persisted blob could not be parsed into a node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not decode smart-collection blob: {reason}")]
pub struct DecodeError {
    pub reason: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        DecodeError { reason: reason.into() }
    }
}

/// A Lua-table leaf value, as addressed by the decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Integer-indexed children, as Lua arrays and the smart-collection
    /// `{0: {...}, 1: {...}, combine: "..."}` table shape both use.
    Table(Vec<(LuaKey, LuaValue)>),
}

/// A Lua table key: either a positional index or a string field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuaKey {
    Index(u32),
    Field(String),
}

impl LuaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&LuaValue> {
        match self {
            LuaValue::Table(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, LuaKey::Field(f) if f == name))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn index(&self, i: u32) -> Option<&LuaValue> {
        match self {
            LuaValue::Table(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, LuaKey::Index(idx) if *idx == i))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Swappable byte-stream decoder. The in-tree implementation is a stub
/// returning `DecodeError` for everything except the empty table, so the
/// smart translator has something to compile against; a real deployment
/// plugs in an actual Lua-table parser here.
pub trait LuaDecode {
    fn decode(&self, bytes: &[u8]) -> Result<LuaValue, DecodeError>;
}

/// Decodes only the empty-table byte sequence `{}`; everything else is
/// reported as undecodable. Stands in for a real Lua-table parser.
pub struct StubDecoder;

impl LuaDecode for StubDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<LuaValue, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::new("not valid UTF-8"))?;
        if text.trim() == "{}" {
            return Ok(LuaValue::Table(Vec::new()));
        }
        Err(DecodeError::new("no Lua-table decoder configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_decoder_handles_empty_table() {
        assert_eq!(StubDecoder.decode(b"{}").unwrap(), LuaValue::Table(Vec::new()));
    }

    #[test]
    fn stub_decoder_rejects_anything_else() {
        assert!(StubDecoder.decode(b"{criteria='rating'}").is_err());
    }

    #[test]
    fn field_and_index_lookup() {
        let table = LuaValue::Table(vec![
            (LuaKey::Field("combine".to_string()), LuaValue::Str("union".to_string())),
            (LuaKey::Index(0), LuaValue::Number(1.0)),
        ]);
        assert_eq!(table.field("combine").and_then(LuaValue::as_str), Some("union"));
        assert_eq!(table.index(0), Some(&LuaValue::Number(1.0)));
    }
}
