//! Tree walk: flatten a Docling export into text blocks, tables and groups.
//!
//! The upstream parser emits a loosely-typed tree of mappings and sequences.
//! Three node shapes carry content:
//!
//! | Shape | Recognised by | Emits |
//! |-------|---------------|-------|
//! | text  | non-blank `text` (or `orig`) string | [`TextBlock`] |
//! | table | `rows` sequence with non-empty cells | [`TableBlock`] |
//! | group | truthy `label` and truthy `children` | [`GroupBlock`] |
//!
//! A node may match several shapes at once, and every node is descended into
//! whether it matched or not. Nothing in here returns an error. A field of
//! the wrong type (say a `rows` that is not a sequence) is treated as absent.
//!
//! The walk uses an explicit stack rather than recursion, so documents nested
//! deeper than the thread stack allows are still processed.

use crate::config::ExtractionStrategy;
use crate::output::{GroupBlock, TableBlock, TextBlock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Everything one walk pulled out of a document.
///
/// Built fresh for every call; never shared between documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub texts: Vec<TextBlock>,
    pub tables: Vec<TableBlock>,
    pub groups: Vec<GroupBlock>,
    /// Indices into `texts` of blocks that are table cells. Their content is
    /// already carried by the enclosing table row.
    #[serde(skip)]
    cell_texts: Vec<usize>,
}

impl Extraction {
    /// Total number of emitted blocks of all three kinds.
    pub fn len(&self) -> usize {
        self.texts.len() + self.tables.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into plain strings: non-cell text blocks in walk order, then
    /// every table row with its cells joined by single spaces. Each piece of
    /// source text appears once.
    pub fn flatten(&self) -> Vec<String> {
        let rows = self.tables.iter().flat_map(|t| t.rows.iter());
        self.texts
            .iter()
            .enumerate()
            .filter(|(i, _)| self.cell_texts.binary_search(i).is_err())
            .map(|(_, t)| t.text.clone())
            .chain(rows.map(|cells| cells.join(" ")))
            .collect()
    }
}

/// Walk `root` with the chosen strategy.
pub fn extract(root: &Value, strategy: ExtractionStrategy, min_string_len: usize) -> Extraction {
    match strategy {
        ExtractionStrategy::Structured => walk(root),
        ExtractionStrategy::AllStrings => Extraction {
            texts: collect_strings(root, min_string_len)
                .into_iter()
                .map(|text| TextBlock {
                    text,
                    label: None,
                    page: None,
                })
                .collect(),
            ..Extraction::default()
        },
    }
}

/// Structured walk over text, table and group nodes.
pub fn walk(root: &Value) -> Extraction {
    let mut acc = Extraction::default();
    let mut stack: Vec<&Value> = vec![root];
    // Cell mappings seen under a `rows` sequence, by address. A cell is always
    // a descendant of its table node, so it is registered before it is popped.
    let mut cells: HashSet<*const Value> = HashSet::new();

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                let is_cell = cells.remove(&(node as *const Value));
                let before = acc.texts.len();
                visit_mapping(map, &mut acc);
                if is_cell && acc.texts.len() > before {
                    acc.cell_texts.push(before);
                }
                if let Some(Value::Array(rows)) = map.get("rows") {
                    cells.extend(
                        rows.iter()
                            .filter_map(|row| row.get("cells")?.as_array())
                            .flatten()
                            .map(|cell| cell as *const Value),
                    );
                }
                // Reverse so children pop in document order.
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    acc
}

/// Drop a parsed tree without recursing, so arbitrarily deep documents can
/// be released as safely as they are walked.
pub fn dispose(root: Value) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, v)| v)),
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
}

/// Blunt fallback: every string anywhere in the tree whose trimmed length
/// exceeds `min_len` characters, trimmed, in document order.
pub fn collect_strings(root: &Value, min_len: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<&Value> = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => stack.extend(map.values().rev()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.chars().count() > min_len {
                    out.push(trimmed.to_string());
                }
            }
            _ => {}
        }
    }

    out
}

fn visit_mapping(node: &Map<String, Value>, acc: &mut Extraction) {
    if let Some(text) = primary_text(node) {
        acc.texts.push(TextBlock {
            text,
            label: node.get("label").and_then(label_string),
            page: page_of(node),
        });
    }

    if let Some(Value::Array(rows)) = node.get("rows") {
        let rows: Vec<Vec<String>> = rows.iter().map(row_cells).filter(|r| !r.is_empty()).collect();
        if !rows.is_empty() {
            acc.tables.push(TableBlock {
                page: page_of(node),
                rows,
            });
        }
    }

    if let (Some(label), Some(children)) = (node.get("label"), node.get("children")) {
        if is_truthy(label) && is_truthy(children) {
            if let Some(label) = label_string(label) {
                acc.groups.push(GroupBlock {
                    label,
                    children_refs: children.clone(),
                });
            }
        }
    }
}

/// `text` when truthy, otherwise `orig`; kept only if it is a string that is
/// not blank after trimming.
fn primary_text(node: &Map<String, Value>) -> Option<String> {
    let chosen = node
        .get("text")
        .filter(|v| is_truthy(v))
        .or_else(|| node.get("orig"))?;
    let trimmed = chosen.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn row_cells(row: &Value) -> Vec<String> {
    let Some(Value::Array(cells)) = row.get("cells") else {
        return Vec::new();
    };
    cells
        .iter()
        .filter_map(|cell| cell.as_object().and_then(primary_text))
        .collect()
}

/// Page number from the first provenance entry, if any.
fn page_of(node: &Map<String, Value>) -> Option<u64> {
    match node.get("prov") {
        Some(Value::Array(prov)) => prov
            .first()?
            .get("page_no")?
            .as_u64()
            .filter(|&p| p > 0),
        _ => None,
    }
}

fn label_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON truthiness: null, false, 0, "" and empty containers are falsy.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_node_with_label_and_page() {
        let doc = json!({
            "texts": [{
                "text": "  Fatura do cartão  ",
                "label": "section_header",
                "prov": [{"page_no": 2}, {"page_no": 3}]
            }]
        });
        let out = walk(&doc);
        assert_eq!(out.texts.len(), 1);
        assert_eq!(out.texts[0].text, "Fatura do cartão");
        assert_eq!(out.texts[0].label.as_deref(), Some("section_header"));
        assert_eq!(out.texts[0].page, Some(2));
    }

    #[test]
    fn test_whitespace_only_text_is_dropped() {
        let out = walk(&json!({"text": "  ", "label": "x"}));
        assert!(out.texts.is_empty());
    }

    #[test]
    fn test_orig_fallback_when_text_empty() {
        let out = walk(&json!({"text": "", "orig": "Saldo anterior"}));
        assert_eq!(out.texts.len(), 1);
        assert_eq!(out.texts[0].text, "Saldo anterior");
        assert_eq!(out.texts[0].page, None);
    }

    #[test]
    fn test_non_string_text_ignored() {
        let out = walk(&json!({"text": 42}));
        assert!(out.texts.is_empty());
        let out = walk(&json!({"text": {"nested": "value"}}));
        // The nested mapping has no text field either.
        assert!(out.texts.is_empty());
    }

    #[test]
    fn test_table_rows_trimmed_and_filtered() {
        let doc = json!({
            "prov": [{"page_no": 4}],
            "rows": [
                {"cells": [{"text": " 12/05 "}, {"orig": "Mercado"}, {"text": "  "}]},
                {"cells": [{"text": ""}]},
                {"cells": "not a list"},
                "not a mapping",
                {"cells": [{"text": "1.234,56"}]}
            ]
        });
        let out = walk(&doc);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].page, Some(4));
        assert_eq!(
            out.tables[0].rows,
            vec![
                vec!["12/05".to_string(), "Mercado".to_string()],
                vec!["1.234,56".to_string()],
            ]
        );
    }

    #[test]
    fn test_table_with_only_empty_cells_is_dropped() {
        let out = walk(&json!({"rows": [{"cells": [{"text": ""}]}]}));
        assert!(out.tables.is_empty());
    }

    #[test]
    fn test_rows_not_a_sequence() {
        let out = walk(&json!({"rows": {"cells": []}}));
        assert!(out.tables.is_empty());
    }

    #[test]
    fn test_group_passes_children_through() {
        let doc = json!({
            "groups": [{
                "label": "list",
                "children": [{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}]
            }, {
                "label": "list",
                "children": []
            }]
        });
        let out = walk(&doc);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].label, "list");
        assert_eq!(
            out.groups[0].children_refs,
            json!([{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}])
        );
    }

    #[test]
    fn test_node_matching_all_three_shapes() {
        let doc = json!({
            "text": "Extrato",
            "label": "table",
            "children": ["#/texts/9"],
            "rows": [{"cells": [{"text": "Saldo"}]}],
            "prov": [{"page_no": 1}]
        });
        let out = walk(&doc);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].children_refs, json!(["#/texts/9"]));
        // The node's own text plus the cell, which is itself a text node.
        let texts: Vec<&str> = out.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Extrato", "Saldo"]);
    }

    #[test]
    fn test_cells_are_also_walked_as_text_nodes() {
        let doc = json!({"data": {"rows": [{"cells": [{"text": "A"}, {"text": "B"}]}]}});
        let out = walk(&doc);
        assert_eq!(out.tables.len(), 1);
        let texts: Vec<&str> = out.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn test_document_order_preserved() {
        let doc = json!({
            "body": {"text": "first"},
            "texts": [{"text": "second"}, {"text": "third", "children": [{"text": "fourth"}]}],
            "tail": {"orig": "fifth"}
        });
        let out = walk(&doc);
        let texts: Vec<&str> = out.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third", "fourth", "fifth"]);
    }

    #[test]
    fn test_emission_count_independent_of_key_order() {
        let a = json!({
            "label": "g", "children": [1], "text": "t",
            "rows": [{"cells": [{"text": "c"}]}],
            "nested": {"orig": "o", "prov": [{"page_no": 1}]}
        });
        let b = json!({
            "nested": {"prov": [{"page_no": 1}], "orig": "o"},
            "rows": [{"cells": [{"text": "c"}]}],
            "text": "t", "children": [1], "label": "g"
        });
        let (wa, wb) = (walk(&a), walk(&b));
        assert_eq!(wa.len(), wb.len());
        assert_eq!(wa.texts.len(), wb.texts.len());
        assert_eq!(wa.tables, wb.tables);
        assert_eq!(wa.groups, wb.groups);
    }

    #[test]
    fn test_page_resolution_edge_cases() {
        for (prov, expected) in [
            (json!([]), None),
            (json!("page 1"), None),
            (json!([{"page_no": "3"}]), None),
            (json!([{"bbox": {}}]), None),
            (json!(["x"]), None),
            (json!([{"page_no": 0}]), None),
            (json!([{"page_no": -2}]), None),
            (json!([{"page_no": 7}]), Some(7)),
        ] {
            let out = walk(&json!({"text": "x", "prov": prov}));
            assert_eq!(out.texts[0].page, expected);
        }
    }

    #[test]
    fn test_scalars_and_null_root() {
        assert!(walk(&json!(null)).is_empty());
        assert!(walk(&json!("a long bare string")).is_empty());
        assert!(walk(&json!([1, true, "x"])).is_empty());
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let mut doc = json!({"text": "leaf"});
        for _ in 0..100_000 {
            doc = json!({ "child": doc });
        }
        let out = walk(&doc);
        assert_eq!(out.texts.len(), 1);
        // The recursive Drop of a 100k-deep Value would overflow the test
        // thread's stack.
        dispose(doc);
    }

    #[test]
    fn test_collect_strings_threshold() {
        let doc = json!({
            "a": "abc",
            "b": "  abcd  ",
            "c": ["pagamento", 123, {"d": "ok"}],
            "e": "ãããã"
        });
        assert_eq!(collect_strings(&doc, 3), vec!["abcd", "pagamento", "ãããã"]);
    }

    #[test]
    fn test_extract_all_strings_strategy() {
        let doc = json!({"schema_name": "DoclingDocument", "texts": [{"text": "Extrato"}]});
        let out = extract(&doc, ExtractionStrategy::AllStrings, 3);
        let texts: Vec<&str> = out.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["DoclingDocument", "Extrato"]);
        assert!(out.tables.is_empty() && out.groups.is_empty());
    }

    #[test]
    fn test_flatten_texts_then_rows() {
        let doc = json!({
            "texts": [{"text": "Extrato"}],
            "tables": [{"rows": [{"cells": [{"text": "01/02"}, {"text": "100,00"}]}]}]
        });
        let out = walk(&doc);
        // Cells stay visible as text blocks but are flattened only via their row.
        assert_eq!(out.texts.len(), 3);
        assert_eq!(out.flatten(), vec!["Extrato", "01/02 100,00"]);
    }

    #[test]
    fn test_flatten_counts_cell_text_once() {
        let doc = json!({
            "texts": [{"text": "Fatura"}],
            "tables": [{"rows": [{"cells": [{"text": "Extrato"}]}]}]
        });
        assert_eq!(walk(&doc).flatten(), vec!["Fatura", "Extrato"]);
    }

    #[test]
    fn test_flatten_keeps_cell_like_nodes_outside_rows() {
        // A mapping with "cells" that is not under "rows" is ordinary text.
        let doc = json!({"cells": [{"text": "Saldo"}], "body": {"text": "Extrato"}});
        assert_eq!(walk(&doc).flatten(), vec!["Saldo", "Extrato"]);
    }
}
