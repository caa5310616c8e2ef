use super::*;
use crate::db::executor::testing::ScriptedExecutor;
use crate::error::ErrorKind;
use serde_json::json;

fn notes() -> TableRef {
    TableRef::parse("app.notes").unwrap()
}

fn note_columns() -> Vec<Value> {
    vec![
        json!({"column_name": "id", "data_type": "int", "column_type": "int",
               "is_nullable": "NO", "column_key": "PRI", "column_default": null, "extra": "auto_increment"}),
        json!({"column_name": "title", "data_type": "varchar", "column_type": "varchar(100)",
               "is_nullable": "NO", "column_key": "", "column_default": null, "extra": ""}),
        json!({"column_name": "body", "data_type": "text", "column_type": "text",
               "is_nullable": "YES", "column_key": "", "column_default": null, "extra": ""}),
        json!({"column_name": "meta", "data_type": "json", "column_type": "json",
               "is_nullable": "YES", "column_key": "", "column_default": null, "extra": ""}),
    ]
}

fn script_page(script: &ScriptedExecutor, total: u64, rows: Vec<Value>) {
    script
        .push_rows(note_columns())
        .push_rows(vec![json!({ "cnt": total })])
        .push_rows(rows);
}

#[tokio::test]
async fn test_export_csv_walks_pages_until_short_page() {
    let script = ScriptedExecutor::new();
    script_page(
        &script,
        3,
        vec![
            json!({"id": 1, "title": "a, b", "body": null, "meta": {"k": 1}}),
            json!({"id": 2, "title": "plain", "body": "x", "meta": null}),
        ],
    );
    script_page(
        &script,
        3,
        vec![json!({"id": 3, "title": "say \"hi\"", "body": "", "meta": [1]})],
    );
    let mut session = script.clone();

    let limits = ExportLimits { page_size: 2, max_pages: 10 };
    let payload = export_table(&mut session, &notes(), &ExportRequest::default(), &limits)
        .await
        .unwrap();

    assert_eq!(payload.content_type, "text/csv; charset=utf-8");
    assert_eq!(payload.filename, "app.notes.csv");
    assert_eq!(payload.row_count, 3);
    assert_eq!(
        payload.body,
        "id,title,body,meta\n\
         1,\"a, b\",,\"{\"\"k\"\":1}\"\n\
         2,plain,x,\n\
         3,\"say \"\"hi\"\"\",,[1]\n"
    );

    let statements = script.statements();
    assert_eq!(statements.len(), 6);
    assert_eq!(statements[2].params, vec![json!(2), json!(0)]);
    assert_eq!(statements[5].params, vec![json!(2), json!(2)]);
    assert_eq!(script.remaining(), 0);
}

#[tokio::test]
async fn test_export_stops_when_total_reached() {
    let script = ScriptedExecutor::new();
    script_page(
        &script,
        2,
        vec![
            json!({"id": 1, "title": "a", "body": null, "meta": null}),
            json!({"id": 2, "title": "b", "body": null, "meta": null}),
        ],
    );
    let mut session = script.clone();

    let limits = ExportLimits { page_size: 2, max_pages: 10 };
    let payload = export_table(&mut session, &notes(), &ExportRequest::default(), &limits)
        .await
        .unwrap();
    assert_eq!(payload.row_count, 2);
    assert_eq!(script.statements().len(), 3);
}

#[tokio::test]
async fn test_export_respects_page_ceiling() {
    let script = ScriptedExecutor::new();
    for id in 0..2 {
        script_page(
            &script,
            100,
            vec![json!({"id": id, "title": "t", "body": null, "meta": null})],
        );
    }
    let mut session = script.clone();

    let limits = ExportLimits { page_size: 1, max_pages: 2 };
    let payload = export_table(&mut session, &notes(), &ExportRequest::default(), &limits)
        .await
        .unwrap();
    assert_eq!(payload.row_count, 2);
    assert_eq!(script.remaining(), 0);
}

#[tokio::test]
async fn test_export_json_passes_filters_through() {
    let script = ScriptedExecutor::new();
    script_page(
        &script,
        1,
        vec![json!({"id": 1, "title": "find me", "body": null, "meta": null})],
    );
    let mut session = script.clone();

    let request = ExportRequest {
        format: TransferFormat::Json,
        q: Some("find".to_string()),
        sort_by: Some("title".to_string()),
        sort_dir: Some("desc".to_string()),
    };
    let payload = export_table(&mut session, &notes(), &request, &ExportLimits::default())
        .await
        .unwrap();

    assert_eq!(payload.content_type, "application/json; charset=utf-8");
    assert_eq!(payload.filename, "app.notes.json");
    let parsed: Value = serde_json::from_str(&payload.body).unwrap();
    assert_eq!(parsed, json!([{"id": 1, "title": "find me", "body": null, "meta": null}]));

    let select = &script.statements()[2];
    assert!(select.sql.contains("LIKE ?"));
    assert!(select.sql.contains("ORDER BY `app`.`notes`.`title` DESC"));
    assert_eq!(select.params.last(), Some(&json!(0)));
    assert_eq!(select.params[select.params.len() - 2], json!(1000));
}

#[tokio::test]
async fn test_import_csv_with_empty_as_null() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(note_columns())
        .push_exec(1, Some(1))
        .push_exec(1, Some(2));
    let mut session = script.clone();

    let request = ImportRequest::csv("id,title,body\n99,First,hello\n,Second,\n");
    let report = import_table(&mut session, &notes(), &request).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);
    assert!(report.errors.is_empty());

    let statements = script.statements();
    // auto_increment id is never written
    assert_eq!(
        statements[1].sql,
        "INSERT INTO `app`.`notes` (`title`, `body`) VALUES (?, ?)"
    );
    assert_eq!(statements[1].params, vec![json!("First"), json!("hello")]);
    // empty body is bound as NULL
    assert_eq!(statements[2].sql, statements[1].sql);
    assert_eq!(statements[2].params, vec![json!("Second"), Value::Null]);
}

#[tokio::test]
async fn test_import_record_with_only_empty_fields_inserts_nulls() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(vec![
            json!({"column_name": "id", "data_type": "int", "column_type": "int",
                   "is_nullable": "NO", "column_key": "PRI", "column_default": null, "extra": "auto_increment"}),
            json!({"column_name": "name", "data_type": "varchar", "column_type": "varchar(50)",
                   "is_nullable": "YES", "column_key": "", "column_default": "'anon'", "extra": ""}),
        ])
        .push_exec(1, Some(1))
        .push_exec(1, Some(2));
    let mut session = script.clone();

    let request = ImportRequest::json(r#"[{"name": "x"}, {"name": ""}]"#);
    let report = import_table(&mut session, &TableRef::parse("app.t").unwrap(), &request)
        .await
        .unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);

    let statements = script.statements();
    assert_eq!(statements[2].sql, "INSERT INTO `app`.`t` (`name`) VALUES (?)");
    assert_eq!(statements[2].params, vec![Value::Null]);
}

#[tokio::test]
async fn test_import_explicit_json_null_is_bound() {
    let script = ScriptedExecutor::new();
    script.push_rows(note_columns()).push_exec(1, Some(1));
    let mut session = script.clone();

    let request = ImportRequest::json(r#"[{"title": "t", "body": null}]"#);
    let report = import_table(&mut session, &notes(), &request).await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(script.statements()[1].params, vec![json!("t"), Value::Null]);
}

#[tokio::test]
async fn test_import_csv_keeps_empty_strings_when_asked() {
    let script = ScriptedExecutor::new();
    script.push_rows(note_columns()).push_exec(1, Some(1));
    let mut session = script.clone();

    let request = ImportRequest {
        empty_as_null: false,
        ..ImportRequest::csv("title;body\nOnly;\n")
    };
    let request = ImportRequest {
        delimiter: ";".to_string(),
        ..request
    };
    let report = import_table(&mut session, &notes(), &request).await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(script.statements()[1].params, vec![json!("Only"), json!("")]);
}

#[tokio::test]
async fn test_import_json_collects_failures_without_aborting() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(note_columns())
        .push_error(GatewayError::ExecutionFailed(
            "Column 'title' cannot be null (1048)".to_string(),
        ))
        .push_exec(1, Some(5));
    let mut session = script.clone();

    let request = ImportRequest::json(
        r#"[{"body": "no title"}, 42, {"unknown": 1}, {"title": "ok", "meta": {"tags": ["a"]}}]"#,
    );
    let report = import_table(&mut session, &notes(), &request).await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 3);
    let indexes: Vec<usize> = report.errors.iter().map(|e| e.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert!(report.errors[0].error.contains("cannot be null"));
    assert!(report.errors[1].error.contains("not a JSON object"));
    assert!(report.errors[2].error.contains("No columns"));

    let last = script.statements().pop().unwrap();
    assert_eq!(last.params, vec![json!("ok"), json!({"tags": ["a"]})]);
}

#[tokio::test]
async fn test_import_rejects_malformed_payloads_up_front() {
    let script = ScriptedExecutor::new();
    let mut session = script.clone();

    let err = import_table(&mut session, &notes(), &ImportRequest::json(r#"{"title": "x"}"#))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = import_table(&mut session, &notes(), &ImportRequest::json("not json"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = import_table(&mut session, &notes(), &ImportRequest::csv("\n\n"))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), "CSV header row is required");

    assert!(script.statements().is_empty());
}
