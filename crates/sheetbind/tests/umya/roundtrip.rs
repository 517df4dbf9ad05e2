use sheetbind::{CellValue, Document, DocumentEngine, Record, UmyaEngine};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Score {
    #[xlsx(r#"column:姓名;colWidth:18;style:{"font":{"bold":true},"fill":{"type":"pattern","color":["#E0EBF5"],"pattern":1}}"#)]
    name: String,
    #[xlsx("column:课程")]
    course: String,
    #[xlsx("column:成绩")]
    score: f64,
}

fn scores() -> Vec<Score> {
    vec![
        Score {
            name: "小明".into(),
            course: "数学".into(),
            score: 95.5,
        },
        Score {
            name: "小红".into(),
            course: "语文".into(),
            score: 88.0,
        },
    ]
}

#[test]
fn records_survive_a_save_and_reopen() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("scores.xlsx");

    let mut doc = Document::new(UmyaEngine::new());
    doc.write_row("Sheet1", ["姓名", "课程", "成绩"])
        .expect("header row");
    doc.write_records("Sheet1", &scores()).expect("write records");
    doc.engine().save_to_path(&path).expect("save workbook");

    let doc = Document::new(UmyaEngine::open_path(&path).expect("reopen workbook"));
    let mut out: Vec<Score> = Vec::new();
    doc.read_rows("Sheet1", 2, &mut out, None).expect("read rows");
    assert_eq!(out, scores());
}

#[test]
fn styles_and_widths_reach_the_workbook() {
    let mut doc = Document::new(UmyaEngine::new());
    doc.write_records("Sheet1", &scores()[..1]).unwrap();
    let book = doc.into_engine().into_spreadsheet();
    let ws = book.get_sheet_by_name("Sheet1").expect("default sheet");

    let style = ws.get_style((1, 1));
    assert_eq!(style.get_font().map(|f| *f.get_bold()), Some(true));
    let width = ws
        .get_column_dimension("A")
        .map(|c| *c.get_width())
        .unwrap_or_default();
    assert_eq!(width, 18.0);
}

#[test]
fn bytes_round_trip_and_header_write() {
    let mut seed = UmyaEngine::new();
    seed.set_cell_value("Sheet1", "A1", CellValue::from("成绩"))
        .unwrap();
    seed.set_cell_value("Sheet1", "B1", CellValue::from("姓名"))
        .unwrap();
    let bytes = seed.save_to_bytes().expect("save to bytes");

    let mut doc = Document::new(UmyaEngine::open_bytes(bytes).expect("open bytes"));
    doc.set_cursor("Sheet1", 2);
    doc.write_rows_by_header("Sheet1", 1, &scores()).unwrap();

    let rows = doc.engine().rows("Sheet1").unwrap();
    assert_eq!(rows[1], vec!["95.5".to_string(), "小明".to_string()]);
    assert_eq!(rows[2], vec!["88".to_string(), "小红".to_string()]);
}

#[test]
fn missing_sheet_is_reported_by_the_engine() {
    let doc = Document::new(UmyaEngine::new());
    let mut out: Vec<Score> = Vec::new();
    let err = doc.read_rows("Nope", 1, &mut out, None).unwrap_err();
    assert!(matches!(
        err.engine_error::<sheetbind::UmyaEngineError>(),
        Some(sheetbind::UmyaEngineError::SheetNotFound(_))
    ));
}
