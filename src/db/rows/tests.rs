use super::*;
use crate::db::executor::testing::ScriptedExecutor;
use serde_json::json;

fn people() -> TableRef {
    TableRef::parse("crm.people").unwrap()
}

fn people_columns() -> Vec<Value> {
    vec![
        json!({"column_name": "id", "data_type": "int", "column_type": "int",
               "is_nullable": "NO", "column_key": "PRI", "column_default": null, "extra": "auto_increment"}),
        json!({"column_name": "name", "data_type": "varchar", "column_type": "varchar(50)",
               "is_nullable": "NO", "column_key": "", "column_default": null, "extra": ""}),
        json!({"column_name": "bio", "data_type": "text", "column_type": "text",
               "is_nullable": "YES", "column_key": "", "column_default": null, "extra": ""}),
        json!({"column_name": "age", "data_type": "int", "column_type": "int",
               "is_nullable": "YES", "column_key": "", "column_default": null, "extra": ""}),
    ]
}

fn request(page: i64, page_size: i64) -> ListRowsRequest {
    ListRowsRequest {
        page: Some(page),
        page_size: Some(page_size),
        ..ListRowsRequest::default()
    }
}

#[test]
fn test_window_clamping() {
    let limits = PageLimits::default();
    assert_eq!(limits.window(&ListRowsRequest::default()), (1, 25));
    assert_eq!(limits.window(&request(0, 0)), (1, 1));
    assert_eq!(limits.window(&request(-3, -10)), (1, 1));
    assert_eq!(limits.window(&request(4, 1000)), (4, 200));
    assert_eq!(PageLimits::fixed(1000).window(&request(2, 1000)), (2, 1000));
}

#[tokio::test]
async fn test_plain_page_without_search_or_sort() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(people_columns())
        .push_rows(vec![json!({"cnt": 3})])
        .push_rows(vec![
            json!({"id": 1, "name": "Ann", "bio": null, "age": 30}),
            json!({"id": 2, "name": "Bob", "bio": "hi", "age": null}),
        ]);
    let mut session = script.clone();

    let page = list_rows(&mut session, &people(), &request(1, 2), &PageLimits::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.columns, vec!["id", "name", "bio", "age"]);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.sort, SortSpec::default());
    assert_eq!(page.q, "");

    let statements = script.statements();
    assert_eq!(statements[1].sql, "SELECT COUNT(*) AS cnt FROM `crm`.`people`");
    assert!(statements[1].params.is_empty());
    assert_eq!(
        statements[2].sql,
        "SELECT `crm`.`people`.`id`, `crm`.`people`.`name`, `crm`.`people`.`bio`, \
         `crm`.`people`.`age` FROM `crm`.`people` LIMIT ? OFFSET ?"
    );
    assert_eq!(statements[2].params, vec![json!(2), json!(0)]);
}

#[tokio::test]
async fn test_search_binds_pattern_per_text_column() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(people_columns())
        .push_rows(vec![json!({"cnt": "1"})])
        .push_rows(vec![json!({"id": 1, "name": "Ann", "bio": null, "age": 30})]);
    let mut session = script.clone();

    let req = ListRowsRequest {
        q: Some("  an%  ".to_string()),
        ..request(1, 25)
    };
    let page = list_rows(&mut session, &people(), &req, &PageLimits::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.q, "an%");

    let statements = script.statements();
    let where_sql = " WHERE `crm`.`people`.`name` LIKE ? OR `crm`.`people`.`bio` LIKE ?";
    assert_eq!(
        statements[1].sql,
        format!("SELECT COUNT(*) AS cnt FROM `crm`.`people`{}", where_sql)
    );
    assert_eq!(statements[1].params, vec![json!("%an%%"), json!("%an%%")]);
    assert!(statements[2].sql.contains(where_sql));
    assert_eq!(
        statements[2].params,
        vec![json!("%an%%"), json!("%an%%"), json!(25), json!(0)]
    );
}

#[tokio::test]
async fn test_search_ignored_without_text_columns() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(vec![json!({"column_name": "id", "data_type": "int", "column_type": "int",
            "is_nullable": "NO", "column_key": "PRI", "column_default": null, "extra": ""})])
        .push_rows(vec![json!({"cnt": 10})])
        .push_rows(vec![]);
    let mut session = script.clone();

    let req = ListRowsRequest {
        q: Some("42".to_string()),
        ..ListRowsRequest::default()
    };
    list_rows(&mut session, &people(), &req, &PageLimits::default())
        .await
        .unwrap();
    assert!(!script.statements()[1].sql.contains("WHERE"));
}

#[tokio::test]
async fn test_known_sort_column_is_applied() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(people_columns())
        .push_rows(vec![json!({"cnt": 0})])
        .push_rows(vec![]);
    let mut session = script.clone();

    let req = ListRowsRequest {
        sort_by: Some("age".to_string()),
        sort_dir: Some("DESC".to_string()),
        ..ListRowsRequest::default()
    };
    let page = list_rows(&mut session, &people(), &req, &PageLimits::default())
        .await
        .unwrap();
    assert_eq!(page.sort.by.as_deref(), Some("age"));
    assert_eq!(page.sort.dir, Some(SortDirection::Desc));
    assert!(script.statements()[2]
        .sql
        .contains(" ORDER BY `crm`.`people`.`age` DESC LIMIT ? OFFSET ?"));
}

#[tokio::test]
async fn test_unknown_sort_column_is_ignored() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(people_columns())
        .push_rows(vec![json!({"cnt": 0})])
        .push_rows(vec![]);
    let mut session = script.clone();

    let req = ListRowsRequest {
        sort_by: Some("age; DROP TABLE people".to_string()),
        sort_dir: Some("desc".to_string()),
        ..ListRowsRequest::default()
    };
    let page = list_rows(&mut session, &people(), &req, &PageLimits::default())
        .await
        .unwrap();
    assert_eq!(page.sort, SortSpec { by: None, dir: None });
    let select = &script.statements()[2].sql;
    assert!(!select.contains("ORDER BY"));
    assert!(!select.contains("DROP"));
}

#[tokio::test]
async fn test_page_past_end_keeps_total() {
    let script = ScriptedExecutor::new();
    script
        .push_rows(people_columns())
        .push_rows(vec![json!({"cnt": 3})])
        .push_rows(vec![]);
    let mut session = script.clone();

    let page = list_rows(&mut session, &people(), &request(5, 2), &PageLimits::default())
        .await
        .unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.page, 5);
    assert_eq!(script.statements()[2].params, vec![json!(2), json!(8)]);
}
