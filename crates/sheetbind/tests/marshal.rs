use sheetbind::{
    BindError, CellValue, Document, DocumentEngine, MemoryEngine, MemoryEngineError, Record,
    RowData, project_record,
};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Score {
    #[xlsx("column:姓名")]
    name: String,
    #[xlsx("column:课程")]
    course: String,
    #[xlsx("column:成绩")]
    score: f64,
}

fn score(name: &str, course: &str, score: f64) -> Score {
    Score {
        name: name.to_string(),
        course: course.to_string(),
        score,
    }
}

#[derive(Debug, Default, Record)]
struct Banner {
    #[xlsx(r#"axis:A-C;style:{"font":{"bold":true},"alignment":{"horizontal":"center"}};colWidth:30"#)]
    title: String,
    #[xlsx(skip)]
    internal: u32,
    #[xlsx("axis:D")]
    pages: u32,
    unannotated: i64,
}

fn doc() -> Document<MemoryEngine> {
    Document::new(MemoryEngine::with_sheets(["Sheet1"]))
}

#[test]
fn write_record_follows_annotations() {
    let mut doc = doc();
    let banner = Banner {
        title: "Report".into(),
        internal: 9,
        pages: 3,
        unannotated: 4,
    };
    doc.write_record("Sheet1", &banner).expect("write banner");

    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "A1"), "Report");
    assert_eq!(engine.value("Sheet1", "D1"), Some(&CellValue::Int(3)));
    assert_eq!(
        engine.merged_cells("Sheet1"),
        &[("A1".to_string(), "C1".to_string())]
    );
    assert_eq!(engine.col_width("Sheet1", "A"), Some(30.0));
    let style = engine.style_of("Sheet1", "A1").expect("title styled");
    assert!(style.font.as_ref().is_some_and(|f| f.bold));

    // Skipped and unannotated fields leave their default columns alone.
    assert_eq!(engine.value("Sheet1", "B1"), None);
    assert_eq!(engine.value("Sheet1", "D2"), None);
    assert_eq!(doc.get_cursor("Sheet1"), 2);
}

#[test]
fn default_axis_is_the_field_position() {
    let mut doc = doc();
    doc.set_cursor("Sheet1", 2);
    doc.write_record("Sheet1", &score("小明", "数学", 95.5)).unwrap();

    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "A2"), "小明");
    assert_eq!(engine.text("Sheet1", "B2"), "数学");
    assert_eq!(engine.value("Sheet1", "C2"), Some(&CellValue::Number(95.5)));
    assert_eq!(doc.get_cursor("Sheet1"), 3);
}

#[test]
fn write_row_is_positional() {
    let mut doc = doc();
    doc.write_row("Sheet1", ["id", "name"]).unwrap();
    doc.write_row("Sheet1", vec![CellValue::Int(1), CellValue::from("Ada")])
        .unwrap();

    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "A1"), "id");
    assert_eq!(engine.text("Sheet1", "B2"), "Ada");
    assert_eq!(engine.value("Sheet1", "A2"), Some(&CellValue::Int(1)));
    assert_eq!(doc.get_cursor("Sheet1"), 3);
}

#[test]
fn write_rows_advances_once_per_element() {
    let mut doc = doc();
    let first = score("小明", "数学", 95.5);
    let rows = vec![
        RowData::from(vec![CellValue::from("姓名"), CellValue::from("课程")]),
        RowData::from(&first),
        RowData::from(vec![CellValue::from("total")]),
    ];
    doc.write_rows("Sheet1", rows).unwrap();

    assert_eq!(doc.get_cursor("Sheet1"), 4);
    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "A1"), "姓名");
    assert_eq!(engine.text("Sheet1", "A2"), "小明");
    assert_eq!(engine.text("Sheet1", "A3"), "total");
}

#[test]
fn write_records_on_other_sheets_keep_their_own_cursor() {
    let mut doc = Document::new(MemoryEngine::with_sheets(["Sheet1", "Sheet2"]));
    let records = [score("a", "x", 1.0), score("b", "y", 2.0)];
    doc.write_records("Sheet1", &records).unwrap();
    doc.write_records("Sheet2", &records[..1]).unwrap();

    assert_eq!(doc.get_cursor("Sheet1"), 3);
    assert_eq!(doc.get_cursor("Sheet2"), 2);
    assert_eq!(doc.engine().text("Sheet1", "A2"), "b");
}

#[test]
fn header_directed_write_places_fields_under_their_headers() {
    let mut engine = MemoryEngine::new();
    engine
        .set_rows("Sheet1", [["课程", "", "成绩", " 姓名 "]])
        .unwrap();
    let mut doc = Document::new(engine);

    let headers = doc.header_map("Sheet1", 1).unwrap();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers.get("姓名").map(String::as_str), Some("D"));

    doc.set_cursor("Sheet1", 2);
    let records = [score("小明", "数学", 95.5), score("小红", "语文", 88.0)];
    doc.write_rows_by_header("Sheet1", 1, &records).unwrap();

    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "A2"), "数学");
    assert_eq!(engine.value("Sheet1", "C2"), Some(&CellValue::Number(95.5)));
    assert_eq!(engine.text("Sheet1", "D2"), "小明");
    assert_eq!(engine.text("Sheet1", "D3"), "小红");
    assert_eq!(engine.value("Sheet1", "B2"), None);
    assert_eq!(doc.get_cursor("Sheet1"), 4);
}

#[test]
fn header_row_past_the_end_falls_back_to_axes() {
    let mut doc = doc();
    assert!(doc.header_map("Sheet1", 7).unwrap().is_empty());
    doc.write_rows_by_header("Sheet1", 7, &[score("a", "b", 1.5)]).unwrap();
    assert_eq!(doc.engine().text("Sheet1", "C1"), "1.5");
}

#[test]
fn project_record_orders_values_by_header() {
    let row = project_record(&score("小明", "数学", 95.5), &["成绩", "备注", "姓名"]).unwrap();
    assert_eq!(
        row,
        vec![
            CellValue::Number(95.5),
            CellValue::Empty,
            CellValue::Text("小明".into())
        ]
    );
}

#[derive(Debug, Default, Record)]
struct BadStyle {
    #[xlsx("style:{not json}")]
    value: String,
}

#[test]
fn malformed_style_reports_the_annotation() {
    let mut doc = doc();
    let err = doc
        .write_record("Sheet1", &BadStyle::default())
        .unwrap_err();
    match err {
        BindError::Style { annotation, .. } => assert_eq!(annotation, "style:{not json}"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(doc.get_cursor("Sheet1"), 1);
}

#[test]
fn engine_errors_pass_through() {
    let mut doc = doc();
    let err = doc
        .write_record("Missing", &score("a", "b", 1.0))
        .unwrap_err();
    assert!(matches!(
        err.engine_error::<MemoryEngineError>(),
        Some(MemoryEngineError::SheetNotFound(name)) if name == "Missing"
    ));
}

#[test]
fn cached_and_uncached_annotations_write_the_same_cells() {
    let records = [score("a", "x", 1.0), score("b", "y", 2.0)];
    let mut cached = doc();
    let mut uncached = Document::with_config(
        MemoryEngine::with_sheets(["Sheet1"]),
        sheetbind::DocumentConfig {
            cache_annotations: false,
            ..Default::default()
        },
    );
    cached.write_records("Sheet1", &records).unwrap();
    uncached.write_records("Sheet1", &records).unwrap();

    let a = cached.engine().rows("Sheet1").unwrap();
    let b = uncached.engine().rows("Sheet1").unwrap();
    assert_eq!(a, b);
}

#[derive(Debug, Default, Record)]
struct Student {
    #[xlsx("axis:A")]
    name: String,
    #[xlsx(skip)]
    tags: Vec<String>,
    #[xlsx("-")]
    nick: Option<String>,
}

#[test]
fn ignored_fields_may_have_any_type() {
    let mut doc = doc();
    let student = Student {
        name: "小明".into(),
        tags: vec!["math".into()],
        nick: Some("ming".into()),
    };
    doc.write_record("Sheet1", &student).unwrap();

    assert_eq!(
        doc.engine().rows("Sheet1").unwrap(),
        vec![vec!["小明".to_string()]]
    );
    assert_eq!(student.cell_value(1), CellValue::Empty);
    assert_eq!(
        Student::descriptor().field(2).map(|f| f.kind),
        Some(sheetbind::FieldKind::Unsupported)
    );
}

#[derive(Debug, Default, Record)]
struct WideName {
    #[xlsx("column:姓名;colWidth:25")]
    name: String,
}

#[test]
fn header_directed_width_lands_on_the_header_column() {
    let mut engine = MemoryEngine::new();
    engine.set_rows("Sheet1", [["课程", "姓名"]]).unwrap();
    let mut doc = Document::new(engine);
    doc.set_cursor("Sheet1", 2);
    doc.write_rows_by_header("Sheet1", 1, &[WideName { name: "小明".into() }])
        .unwrap();

    let engine = doc.engine();
    assert_eq!(engine.text("Sheet1", "B2"), "小明");
    assert_eq!(engine.col_width("Sheet1", "B"), Some(25.0));
    assert_eq!(engine.col_width("Sheet1", "A"), None);
}
