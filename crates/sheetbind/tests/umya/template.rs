use serde_json::json;
use sheetbind::{CellValue, Document, DocumentEngine, UmyaEngine};

#[test]
fn renders_a_range_in_an_xlsx_sheet() {
    let mut engine = UmyaEngine::new();
    for (axis, text) in [
        ("A1", "{{ .Title }}"),
        ("A2", "{{ range .Items }}"),
        ("A3", "{{ .Name }}"),
        ("B3", "{{ .Qty }}"),
        ("A4", "{{ end }}"),
        ("A5", "footer"),
    ] {
        engine
            .set_cell_value("Sheet1", axis, CellValue::from(text))
            .unwrap();
    }

    let mut doc = Document::new(engine);
    doc.render(
        "Sheet1",
        &json!({
            "Title": "Stock",
            "Items": [{"Name": "pen", "Qty": 2}, {"Name": "ink", "Qty": 5}]
        }),
    )
    .expect("render");

    let rows = doc.engine().rows("Sheet1").unwrap();
    let text: Vec<Vec<&str>> = rows
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect();
    assert_eq!(
        text,
        vec![
            vec!["Stock"],
            vec!["pen", "2"],
            vec!["ink", "5"],
            vec!["footer"],
        ]
    );
}
