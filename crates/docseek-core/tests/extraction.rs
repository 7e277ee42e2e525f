use docseek_core::layout::{Table, TextModel, TextUnit};
use docseek_core::models::{
    EngineConfig, Expression, FieldConfig, FieldSpec, GridConfig, ScalarType, ValueType,
};
use docseek_core::{Document, FieldExtractor, NodeLabel, SearchTree};
use pretty_assertions::assert_eq;

fn extract(fields: &FieldConfig, document: &Document) -> Vec<(String, String)> {
    let result = FieldExtractor::default().extract(fields, document).unwrap();
    result
        .values
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn pair(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn resolve(fields: &FieldConfig, document: &Document) -> SearchTree {
    FieldExtractor::default().resolve(fields, document).unwrap()
}

#[test]
fn test_total_on_line_three() {
    let mut text = TextModel::new();
    text.push(1, TextUnit::new("ACME Corp", 0.0, 0.0)).unwrap();
    text.push(3, TextUnit::new("Total: 450", 0.0, 20.0)).unwrap();
    let document = Document::new(text, Vec::new(), &GridConfig::default()).unwrap();

    let fields = FieldConfig::new(vec![
        FieldSpec::new("Total", ValueType::NUMBER)
            .with_expression(Expression::new(r"Total:\s*(\d+)", 0, 0)),
    ]);

    assert_eq!(extract(&fields, &document), vec![pair("Total", "450")]);
}

#[test]
fn test_configuration_from_json() {
    let fields = FieldConfig::from_json(
        r#"{
            "fields": [
                {
                    "name": "Invoice date",
                    "value_type": "Date",
                    "check": "Date",
                    "expressions": [
                        { "pattern": "Date" },
                        { "pattern": "\\d{2}\\.\\d{2}\\.\\d{4}", "first": 0, "second": 1 }
                    ]
                },
                {
                    "name": "Invoice number",
                    "check": "Invoice No",
                    "expressions": [
                        { "pattern": "Invoice No" },
                        { "pattern": "^(\\S+)$", "first": 0, "second": 1 }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();
    let document =
        Document::from_text("Invoice No   FV/001/2024\nDate   15.01.2024\n\nThank you").unwrap();

    assert_eq!(
        extract(&fields, &document),
        vec![
            pair("Invoice date", "01/15/2024"),
            pair("Invoice number", "FV/001/2024")
        ]
    );
}

#[test]
fn test_ties_create_sibling_lines() {
    let document = Document::from_text("Total\n450\n\nnotes\nTotal\n120\nTotl\n999").unwrap();
    let fields = FieldConfig::new(vec![
        FieldSpec::new("Total", ValueType::NUMBER)
            .with_check("Total")
            .with_expression(Expression::new("Tot[a-z]+", 0, 0))
            .with_expression(Expression::new(r"^(\d+)$", 1, 0)),
    ]);

    let tree = resolve(&fields, &document);
    let field = tree.field_node("Total").unwrap();
    let lines: Vec<u32> = tree
        .children(field)
        .iter()
        .map(|c| {
            assert_eq!(tree[*c].label, NodeLabel::Line);
            tree[*c].lines.primary()
        })
        .collect();
    // "Totl" scores below the exact matches and is dropped
    assert_eq!(lines, vec![1, 5]);
    assert_eq!(tree.field_value(field), "450|120");
}

#[test]
fn test_path_length_is_expression_count_plus_one() {
    let document = Document::from_text("Invoice\nNumber   123\nDate   15.01.2024").unwrap();
    let fields = FieldConfig::new(vec![
        FieldSpec::new("Date", ValueType::DATE)
            .with_check("Invoice")
            .with_expression(Expression::new("Invoice", 0, 0))
            .with_expression(Expression::new("Date", 1, 0))
            .with_expression(Expression::new(r"\d{2}\.\d{2}\.\d{4}", 0, 1)),
    ]);

    let tree = resolve(&fields, &document);
    let field = tree.field_node("Date").unwrap();
    assert_eq!(tree.field_value(field), "01/15/2024");

    let depths = tree.field_depths(field);
    assert!(depths.len() > 1, "offset search should have added a branch");
    assert!(depths.iter().all(|d| *d == 4), "{depths:?}");
}

#[test]
fn test_offset_search_is_bounded() {
    let lines: Vec<String> = (1..=200)
        .map(|n| if n == 100 { "Total".to_string() } else { "7".to_string() })
        .collect();
    let document = Document::from_text(&lines.join("\n")).unwrap();
    let fields = FieldConfig::new(vec![
        FieldSpec::new("Total", ValueType::NUMBER)
            .with_check("Total")
            .with_expression(Expression::new("Total", 0, 0))
            .with_expression(Expression::new(r"^(\d+)$", 0, 0)),
    ]);

    let tree = resolve(&fields, &document);
    let field = tree.field_node("Total").unwrap();
    let terminals = tree.terminals(field);
    let found: Vec<u32> = terminals
        .iter()
        .filter(|t| tree[**t].success)
        .map(|t| tree[*t].lines.primary())
        .collect();

    assert_eq!(terminals.len(), 11);
    assert_eq!(found, vec![95, 96, 97, 98, 99, 101, 102, 103, 104, 105]);
    assert_eq!(tree.field_value(field), "7");
}

fn two_totals() -> Document {
    let mut text = TextModel::new();
    text.push(1, TextUnit::new("Invoice", 0.0, 0.0)).unwrap();
    text.push(1, TextUnit::new("Page 1", 300.0, 0.0)).unwrap();
    text.push(2, TextUnit::new("Total: 1", 0.0, 10.0)).unwrap();
    text.push(30, TextUnit::new("Total: 2", 300.0, 300.0)).unwrap();
    Document::new(text, Vec::new(), &GridConfig::default()).unwrap()
}

fn total(grid: Option<(i32, i32)>) -> FieldSpec {
    let spec = FieldSpec::new("Total", ValueType::NUMBER)
        .with_expression(Expression::new(r"Total:\s*(\d+)", 0, 0));
    match grid {
        Some((row, col)) => spec.with_grid(row, col),
        None => spec,
    }
}

#[test]
fn test_grid_restricts_positional_search() {
    let document = two_totals();

    let everywhere = FieldConfig::new(vec![total(None)]);
    assert_eq!(extract(&everywhere, &document), vec![pair("Total", "1|2")]);

    let bottom_right = FieldConfig::new(vec![total(Some((2, 2)))]);
    assert_eq!(extract(&bottom_right, &document), vec![pair("Total", "2")]);
}

#[test]
fn test_grid_falls_back_and_rolls_back() {
    let document = two_totals();

    for grid in [(1, 1), (7, 7)] {
        let fields = FieldConfig::new(vec![total(Some(grid))]);
        let tree = resolve(&fields, &document);
        let field = tree.field_node("Total").unwrap();

        assert_eq!(tree.field_value(field), "1|2");
        assert_eq!(tree.children(field).len(), 2);
        assert!(tree.field_depths(field).iter().all(|d| *d == 2));
    }
}

fn invoice_tables() -> Vec<Table> {
    vec![
        Table::from_rows(
            vec![
                vec!["Item", "Qty", "Amount"],
                vec!["Widget", "2", "10.00"],
                vec!["Total", "", "20.00"],
            ],
            (0.0, 0.0),
        ),
        Table::from_rows(
            vec![vec!["Item", "Amount"], vec!["Total", "1.234,50"]],
            (300.0, 300.0),
        ),
    ]
}

fn table_total(grid: Option<(i32, i32)>) -> FieldConfig {
    let spec = FieldSpec::new("Total", ValueType::table(ScalarType::Number))
        .with_check("Total")
        .with_expression(Expression::new("Total", 0, 0))
        .with_expression(Expression::new(r"[\d.,]+", 0, 2));
    let spec = match grid {
        Some((row, col)) => spec.with_grid(row, col),
        None => spec,
    };
    FieldConfig::new(vec![spec])
}

#[test]
fn test_table_field_uses_cell_offsets() {
    let document =
        Document::new(TextModel::new(), invoice_tables(), &GridConfig::default()).unwrap();
    assert_eq!(extract(&table_total(None), &document), vec![pair("Total", "20.00")]);
}

#[test]
fn test_table_field_uses_first_matching_table() {
    // The first table has no column two positions right of "Total".
    let document = Document::new(
        TextModel::new(),
        invoice_tables().into_iter().rev().collect(),
        &GridConfig::default(),
    )
    .unwrap();
    assert_eq!(extract(&table_total(None), &document), vec![pair("Total", "")]);
}

#[test]
fn test_table_grid_restriction_and_fallback() {
    let document =
        Document::new(TextModel::new(), invoice_tables(), &GridConfig::default()).unwrap();

    let fields = FieldConfig::new(vec![
        FieldSpec::new("Total", ValueType::table(ScalarType::Number))
            .with_check("Total")
            .with_grid(2, 2)
            .with_expression(Expression::new("Total", 0, 1)),
    ]);
    assert_eq!(extract(&fields, &document), vec![pair("Total", "1234.50")]);

    // Nothing in the middle segment: the whole document is searched.
    assert_eq!(extract(&table_total(Some((1, 1))), &document), vec![pair("Total", "20.00")]);
}

#[test]
fn test_phonetic_mode_matches_spelling_variants() {
    let fields = |phonetic: bool| {
        FieldConfig::new(vec![
            FieldSpec::new("Carrier", ValueType::STRING)
                .with_check("Burroughs")
                .with_phonetic(phonetic)
                .with_expression(Expression::new("^[A-Z][a-z]+$", 0, 0)),
        ])
    };

    let extractor = FieldExtractor::new(EngineConfig::default()).unwrap();
    let document = extractor
        .prepare(TextModel::from_text("Carrier:  Burrows  Ltd"), Vec::new())
        .unwrap();

    let found = extractor.extract(&fields(true), &document).unwrap();
    assert_eq!(found.values.get("Carrier"), Some("Burrows"));

    let missed = extractor.extract(&fields(false), &document).unwrap();
    assert_eq!(missed.values.get("Carrier"), Some(""));
    assert_eq!(missed.warnings.len(), 1);
}
