//! Smart-collection translator: turns a decoded criteria tree into the same
//! kind of SQL the generic compiler produces for the text DSL, but without
//! ever going through `criteria_lexer` — the tree is already structured.
//!
//! The persisted shape is `{0: node, 1: node, ..., combine: "intersect"}`.
//! Each node compiles to its own complete, independent
//! `SELECT id_local FROM ...` via `Compiler::assemble`, and sibling row
//! sets combine with `UNION`/`INTERSECT` — simpler to get right than
//! threading join aliases and boolean glue across an arbitrarily nested
//! tree.

pub mod errors;
mod families;

use crate::compiler::Compiler;
use crate::config::Config;
use crate::lua_decode::{LuaDecode, LuaValue};

pub use errors::SmartError;

/// How a keyword criterion's value is matched against a candidate keyword
/// name, before the matched subtree expands to ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    WholeWord,
    Prefix,
    Suffix,
    Substring,
}

/// Resolves a keyword pattern to every keyword id in its matched
/// subtree(s), the way `LRKeywords.hierachical_indexes` walks
/// `AgLibraryKeyword.parent` down from each name match. `None` means no
/// index is wired — the translator then falls back to a direct `LIKE` on
/// the keyword name with no hierarchy, which is what a pure function
/// without catalog access can still do.
pub trait KeywordIndex {
    fn hierarchical_ids(&self, pattern: &str, mode: KeywordMatch) -> Option<Vec<i64>>;
}

pub struct NullKeywordIndex;

impl KeywordIndex for NullKeywordIndex {
    fn hierarchical_ids(&self, _pattern: &str, _mode: KeywordMatch) -> Option<Vec<i64>> {
        None
    }
}

/// One leaf criterion in the decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub criteria: String,
    pub operation: String,
    pub value: String,
    pub value2: Option<String>,
    pub units: Option<String>,
}

/// How a group of child nodes combines into one row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Intersect,
    Union,
}

impl Combine {
    fn from_str(text: &str) -> Combine {
        match text {
            "union" => Combine::Union,
            _ => Combine::Intersect,
        }
    }

    fn sql_keyword(self) -> &'static str {
        match self {
            Combine::Intersect => "INTERSECT",
            Combine::Union => "UNION",
        }
    }
}

/// A decoded smart-collection tree: either a single leaf criterion, or a
/// `combine` of child trees.
#[derive(Debug, Clone, PartialEq)]
pub enum SmartTree {
    Leaf(Node),
    Group(Combine, Vec<SmartTree>),
}

/// Leaf values in a persisted blob are strings, numbers, or booleans
/// (`value = false` for `hasGPSData`); the translator works on their text
/// form uniformly.
fn lua_scalar_to_string(value: &LuaValue) -> Option<String> {
    match value {
        LuaValue::Str(s) => Some(s.clone()),
        LuaValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        LuaValue::Number(n) => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        _ => None,
    }
}

impl Node {
    fn from_lua(table: &LuaValue) -> Result<Node, SmartError> {
        let field = |name: &str| table.field(name).and_then(lua_scalar_to_string);
        let criteria = field("criteria").ok_or_else(|| SmartError::new("?", "node missing \"criteria\""))?;
        let operation = field("operation").ok_or_else(|| SmartError::new(criteria.as_str(), "node missing \"operation\""))?;
        let value = field("value").ok_or_else(|| SmartError::new(criteria.as_str(), "node missing \"value\""))?;
        let value2 = field("value2");
        // Lightroom persists the unit of an inLast range as `_units`.
        let units = field("_units");
        Ok(Node { criteria, operation, value, value2, units })
    }
}

impl SmartTree {
    /// Decodes the table shape Lightroom persists: a leaf has a `criteria`
    /// field, a group has a `combine` field plus integer-indexed children.
    pub fn from_lua(table: &LuaValue) -> Result<SmartTree, SmartError> {
        if table.field("criteria").is_some() {
            return Ok(SmartTree::Leaf(Node::from_lua(table)?));
        }
        let combine = table
            .field("combine")
            .and_then(LuaValue::as_str)
            .map(Combine::from_str)
            .unwrap_or(Combine::Intersect);
        let mut children = Vec::new();
        let mut i = 0;
        while let Some(child) = table.index(i) {
            children.push(SmartTree::from_lua(child)?);
            i += 1;
        }
        if children.is_empty() {
            return Err(SmartError::new("?", "empty smart-collection group"));
        }
        Ok(SmartTree::Group(combine, children))
    }
}

fn compile_tree(
    tree: &SmartTree,
    compiler: &Compiler,
    cfg: &Config,
    keywords: &dyn KeywordIndex,
) -> Result<String, SmartError> {
    match tree {
        SmartTree::Leaf(node) => {
            let fragment = families::translate_node(node, cfg, keywords)?;
            let result = compiler
                .assemble("id", &fragment.where_sql, &fragment.joins)
                .map_err(|e| SmartError::new(node.criteria.as_str(), e.to_string()))?;
            Ok(result.sql)
        }
        SmartTree::Group(combine, children) => {
            let parts: Result<Vec<String>, SmartError> =
                children.iter().map(|c| compile_tree(c, compiler, cfg, keywords)).collect();
            let parts = parts?;
            Ok(parts.join(&format!(" {} ", combine.sql_keyword())))
        }
    }
}

/// Translates a decoded smart-collection tree into `SELECT i.id_local FROM
/// Adobe_images i WHERE ...` wrapped as a single outer query selecting from
/// the union/intersect of every leaf's own row set. Keyword criteria match
/// by name only, with no hierarchy expansion; use `translate_with_keywords`
/// to wire a real index.
pub fn translate(tree: &SmartTree, cfg: &Config) -> Result<String, SmartError> {
    translate_with_keywords(tree, cfg, &NullKeywordIndex)
}

/// As `translate`, but resolves `keywords` criteria through `index` for
/// full subtree expansion.
pub fn translate_with_keywords(
    tree: &SmartTree,
    cfg: &Config,
    index: &dyn KeywordIndex,
) -> Result<String, SmartError> {
    let compiler = Compiler::photo(cfg);
    let inner = compile_tree(tree, &compiler, cfg, index)?;
    let sql = format!("SELECT i.id_local FROM Adobe_images i WHERE i.id_local IN ({})", inner);
    log::info!("smart SQL = {}", sql);
    Ok(sql)
}

/// Decodes a persisted blob and translates it in one step.
pub fn translate_blob(
    bytes: &[u8],
    decoder: &dyn LuaDecode,
    cfg: &Config,
    index: &dyn KeywordIndex,
) -> Result<String, SmartError> {
    let table = decoder.decode(bytes).map_err(|e| SmartError::new("?", e.reason))?;
    let tree = SmartTree::from_lua(&table)?;
    translate_with_keywords(&tree, cfg, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua_decode::LuaKey;

    fn leaf(criteria: &str, operation: &str, value: &str) -> LuaValue {
        LuaValue::Table(vec![
            (LuaKey::Field("criteria".to_string()), LuaValue::Str(criteria.to_string())),
            (LuaKey::Field("operation".to_string()), LuaValue::Str(operation.to_string())),
            (LuaKey::Field("value".to_string()), LuaValue::Str(value.to_string())),
        ])
    }

    #[test]
    fn decodes_a_single_leaf() {
        let table = leaf("rating", ">=", "4");
        let tree = SmartTree::from_lua(&table).unwrap();
        assert_eq!(tree, SmartTree::Leaf(Node {
            criteria: "rating".to_string(),
            operation: ">=".to_string(),
            value: "4".to_string(),
            value2: None,
            units: None,
        }));
    }

    #[test]
    fn decodes_boolean_and_numeric_leaf_values() {
        let table = LuaValue::Table(vec![
            (LuaKey::Field("criteria".to_string()), LuaValue::Str("hasGPSData".to_string())),
            (LuaKey::Field("operation".to_string()), LuaValue::Str("==".to_string())),
            (LuaKey::Field("value".to_string()), LuaValue::Bool(false)),
            (LuaKey::Field("value2".to_string()), LuaValue::Number(3.0)),
        ]);
        let tree = SmartTree::from_lua(&table).unwrap();
        let SmartTree::Leaf(node) = tree else { panic!("expected a leaf") };
        assert_eq!(node.value, "false");
        assert_eq!(node.value2.as_deref(), Some("3"));
    }

    #[test]
    fn decodes_an_intersect_group() {
        let table = LuaValue::Table(vec![
            (LuaKey::Field("combine".to_string()), LuaValue::Str("intersect".to_string())),
            (LuaKey::Index(0), leaf("rating", ">=", "4")),
            (LuaKey::Index(1), leaf("hasGPSData", "isTrue", "true")),
        ]);
        let tree = SmartTree::from_lua(&table).unwrap();
        match tree {
            SmartTree::Group(Combine::Intersect, children) => assert_eq!(children.len(), 2),
            other => panic!("unexpected tree shape: {:?}", other),
        }
    }

    /// A collection-name criterion on its own compiles to a `col1`-aliased
    /// join.
    #[test]
    fn collection_name_criterion_compiles_with_col1_alias() {
        let cfg = Config::new("catalog.lrcat");
        let table = leaf("collection", "beginsWith", "Holiday");
        let tree = SmartTree::from_lua(&table).unwrap();
        let sql = translate(&tree, &cfg).unwrap();
        assert!(sql.contains("col1.name LIKE \"Holiday%\""), "{}", sql);
    }

    #[test]
    fn two_leaves_intersect_by_default() {
        let cfg = Config::new("catalog.lrcat");
        let table = LuaValue::Table(vec![
            (LuaKey::Index(0), leaf("rating", ">=", "4")),
            (LuaKey::Index(1), leaf("hasGPSData", "isTrue", "true")),
        ]);
        let tree = SmartTree::from_lua(&table).unwrap();
        let sql = translate(&tree, &cfg).unwrap();
        assert!(sql.contains(" INTERSECT "), "{}", sql);
    }

    #[test]
    fn rejects_an_unknown_criterion() {
        let cfg = Config::new("catalog.lrcat");
        let table = leaf("bogus", "==", "1");
        let tree = SmartTree::from_lua(&table).unwrap();
        assert!(translate(&tree, &cfg).is_err());
    }

    struct FixedKeywordIndex(Vec<i64>);
    impl KeywordIndex for FixedKeywordIndex {
        fn hierarchical_ids(&self, _pattern: &str, _mode: KeywordMatch) -> Option<Vec<i64>> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn wired_keyword_index_expands_to_an_id_list() {
        let cfg = Config::new("catalog.lrcat");
        let table = leaf("keywords", "words", "Nature");
        let tree = SmartTree::from_lua(&table).unwrap();
        let index = FixedKeywordIndex(vec![10, 11, 12]);
        let sql = translate_with_keywords(&tree, &cfg, &index).unwrap();
        assert!(sql.contains("kwi1.tag IN (10,11,12)"), "{}", sql);
    }

    #[test]
    fn wired_keyword_index_with_no_match_excludes_everything() {
        let cfg = Config::new("catalog.lrcat");
        let table = leaf("keywords", "words", "Nonexistent");
        let tree = SmartTree::from_lua(&table).unwrap();
        let index = FixedKeywordIndex(Vec::new());
        let sql = translate_with_keywords(&tree, &cfg, &index).unwrap();
        assert!(sql.contains("1=0"), "{}", sql);
    }
}
