//! Instance component tests against a scripted in-memory session.
//!
//! Run with: cargo test --test server_component_tests

mod support;

use std::sync::Arc;

use oracle_agent_plugin::oracle::{OracleServerComponent, PluginError, Session};
use oracle_agent_plugin::plugin::{
    AvailabilityType, Configuration, DatabaseComponent, MeasurementFacet, MeasurementReport,
    MeasurementScheduleRequest, OperationFacet, ResourceComponent, ResourceContext,
};
use support::{rows, scalar, FakeConnector, Reply, Script};

fn instance_script() -> Script {
    Script::new()
        .on("DBA_DATA_FILES", Reply::Rows(scalar(Some("1073741824"))))
        .on(
            "V$SYSSTAT",
            Reply::Rows(rows(
                &[("NAME", "VARCHAR2"), ("VALUE", "NUMBER")],
                &[
                    &[Some("user commits"), Some("1200")],
                    &[Some("opened cursors current"), Some("57")],
                ],
            )),
        )
        .on(
            "V$PARAMETER",
            Reply::Rows(rows(
                &[("NAME", "VARCHAR2"), ("VALUE", "VARCHAR2")],
                &[
                    &[Some("open_cursors"), Some("300")],
                    &[Some("db_name"), Some("ORCL")],
                    &[Some("processes"), None],
                ],
            )),
        )
        .on(
            "total_cur",
            Reply::Rows(rows(
                &[
                    ("USERNAME", "VARCHAR2"),
                    ("MACHINE", "VARCHAR2"),
                    ("TOTAL_CUR", "NUMBER"),
                    ("AVG_CUR", "NUMBER"),
                    ("MAX_CUR", "NUMBER"),
                ],
                &[
                    &[Some("APP"), Some("web-01"), Some("40"), Some("10"), Some("22")],
                    &[None, Some("db-host"), Some("12"), Some("1"), Some("4")],
                ],
            )),
        )
        .on(
            "opened cursors current",
            Reply::Rows(rows(
                &[
                    ("SID", "NUMBER"),
                    ("USERNAME", "VARCHAR2"),
                    ("SERIAL#", "NUMBER"),
                    ("VALUE", "NUMBER"),
                ],
                &[&[Some("137"), Some("APP"), Some("4021"), Some("18")]],
            )),
        )
        .on(
            "session cursor cache count",
            Reply::Rows(rows(
                &[
                    ("USERNAME", "VARCHAR2"),
                    ("SID", "NUMBER"),
                    ("SERIAL#", "NUMBER"),
                    ("VALUE", "NUMBER"),
                ],
                &[
                    &[Some("APP"), Some("137"), Some("4021"), Some("50")],
                    &[Some("SYS"), Some("5"), Some("1"), Some("3")],
                ],
            )),
        )
        .on(
            "v$open_cursor",
            Reply::Rows(rows(
                &[("USER_NAME", "VARCHAR2"), ("SID", "NUMBER"), ("SQL_TEXT", "VARCHAR2")],
                &[&[Some("APP"), Some("137"), Some("SELECT * FROM orders")]],
            )),
        )
        .on("UPDATE t SET x=1", Reply::Updated(3))
        .on(
            "SELECT a,b FROM t",
            Reply::Rows(rows(
                &[("A", "NUMBER"), ("B", "VARCHAR2")],
                &[&[Some("1"), Some("one")], &[Some("2"), None]],
            )),
        )
        .on("SELECT broken", Reply::Fail("ORA-00942: table or view does not exist".to_string()))
}

fn started(connector: &Arc<FakeConnector>) -> OracleServerComponent {
    let mut server = OracleServerComponent::with_connector(connector.clone());
    server
        .start(ResourceContext::new("ORCL", support::configuration()))
        .expect("start should succeed");
    server
}

#[test]
fn test_start_connects_eagerly() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    assert_eq!(connector.connects(), 1);
    assert_eq!(server.url().as_deref(), Some("jdbc:oracle:thin:@db.example.com:1521:ORCL"));
}

#[test]
fn test_start_propagates_connection_failure() {
    let connector = FakeConnector::new(instance_script());
    connector.set_failing(true);

    let mut server = OracleServerComponent::with_connector(connector.clone());
    let err = server
        .start(ResourceContext::new("ORCL", support::configuration()))
        .unwrap_err();
    assert!(matches!(err, PluginError::Connection(_)));
}

#[test]
fn test_start_rejects_unknown_driver() {
    let connector = FakeConnector::new(instance_script());
    let mut server = OracleServerComponent::with_connector(connector.clone());

    let configuration = support::configuration().with("driverClass", "com.example.NoSuchDriver");
    let err = server.start(ResourceContext::new("ORCL", configuration)).unwrap_err();

    assert!(matches!(err, PluginError::Configuration(_)));
    assert!(err.to_string().contains("Specified JDBC driver class (com.example.NoSuchDriver) not found."));
    assert_eq!(connector.connects(), 0);
}

#[test]
fn test_availability_issues_no_query() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    assert_eq!(server.availability(), AvailabilityType::Up);
    assert!(connector.last_session().executed().is_empty());
}

#[test]
fn test_availability_down_when_connection_cannot_be_rebuilt() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    connector.last_session().mark_closed();
    connector.set_failing(true);
    assert_eq!(server.availability(), AvailabilityType::Down);

    connector.set_failing(false);
    assert_eq!(server.availability(), AvailabilityType::Up);
}

#[test]
fn test_unstarted_component_is_down() {
    let connector = FakeConnector::new(instance_script());
    let server = OracleServerComponent::with_connector(connector.clone());
    assert_eq!(server.availability(), AvailabilityType::Down);
    assert_eq!(connector.connects(), 0);
}

#[test]
fn test_remove_connection_rebuilds_on_next_access() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);
    let first = server.connection().unwrap();

    server.remove_connection();
    let second = server.connection().unwrap();

    assert_eq!(connector.connects(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.is_closed(), "remove_connection must not close the old session");
}

#[test]
fn test_total_size_reported_regardless_of_kind() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    for request in [
        MeasurementScheduleRequest::numeric("totalSize"),
        MeasurementScheduleRequest::trait_value("totalSize"),
    ] {
        let mut report = MeasurementReport::new();
        server.get_values(&mut report, &[request]).unwrap();
        assert_eq!(report.value_of("totalSize"), Some(1073741824.0));
    }

    let session = connector.last_session();
    assert_eq!(session.count("DBA_DATA_FILES"), 2);
    assert_eq!(session.count("V$SYSSTAT"), 0);
    assert_eq!(session.count("V$PARAMETER"), 0);
}

#[test]
fn test_total_size_null_sum_is_zero() {
    let connector = FakeConnector::new(Script::new().on("DBA_DATA_FILES", Reply::Rows(scalar(None))));
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    server
        .get_values(&mut report, &[MeasurementScheduleRequest::numeric("totalSize")])
        .unwrap();
    assert_eq!(report.value_of("totalSize"), Some(0.0));
}

#[test]
fn test_total_size_without_rows_is_nan() {
    let connector = FakeConnector::new(
        Script::new().on("DBA_DATA_FILES", Reply::Rows(rows(&[("SUM(BYTES)", "NUMBER")], &[]))),
    );
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    server
        .get_values(&mut report, &[MeasurementScheduleRequest::numeric("totalSize")])
        .unwrap();
    assert!(report.value_of("totalSize").unwrap().is_nan());
}

#[test]
fn test_failed_collection_reports_nothing() {
    let connector = FakeConnector::new(
        Script::new()
            .on("DBA_DATA_FILES", Reply::Rows(scalar(Some("1024"))))
            .on("V$SYSSTAT", Reply::Fail("ORA-01031: insufficient privileges".to_string())),
    );
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    let result = server.get_values(
        &mut report,
        &[
            MeasurementScheduleRequest::numeric("totalSize"),
            MeasurementScheduleRequest::numeric("user commits"),
        ],
    );

    assert!(matches!(result, Err(PluginError::Query(_))));
    assert_eq!(report.len(), 0);
    assert_eq!(connector.last_session().count("DBA_DATA_FILES"), 1);
}

#[test]
fn test_statistics_and_traits_use_their_own_views() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    server
        .get_values(
            &mut report,
            &[
                MeasurementScheduleRequest::numeric("user commits"),
                MeasurementScheduleRequest::numeric("opened cursors current"),
                MeasurementScheduleRequest::trait_value("open_cursors"),
                MeasurementScheduleRequest::numeric("open_cursors"),
                MeasurementScheduleRequest::trait_value("user commits"),
            ],
        )
        .unwrap();

    assert_eq!(report.len(), 3);
    assert_eq!(report.value_of("user commits"), Some(1200.0));
    assert_eq!(report.value_of("opened cursors current"), Some(57.0));
    assert_eq!(report.value_of("open_cursors"), Some(300.0));

    let session = connector.last_session();
    assert_eq!(session.count("V$SYSSTAT"), 1);
    assert_eq!(session.count("V$PARAMETER"), 1);
}

#[test]
fn test_absent_and_non_numeric_names_are_skipped() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    server
        .get_values(
            &mut report,
            &[
                MeasurementScheduleRequest::trait_value("no_such_parameter"),
                MeasurementScheduleRequest::trait_value("db_name"),
                MeasurementScheduleRequest::trait_value("processes"),
                MeasurementScheduleRequest::numeric("no such statistic"),
            ],
        )
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_lookup_maps_rebuilt_every_call() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);
    let metrics = [MeasurementScheduleRequest::numeric("user commits")];

    server.get_values(&mut MeasurementReport::new(), &metrics).unwrap();
    server.get_values(&mut MeasurementReport::new(), &metrics).unwrap();

    assert_eq!(connector.last_session().count("V$SYSSTAT"), 2);
}

#[test]
fn test_get_values_propagates_query_failure() {
    let connector = FakeConnector::new(
        Script::new().on("V$SYSSTAT", Reply::Fail("ORA-01031: insufficient privileges".to_string())),
    );
    let server = started(&connector);

    let mut report = MeasurementReport::new();
    let err = server
        .get_values(&mut report, &[MeasurementScheduleRequest::numeric("user commits")])
        .unwrap_err();
    assert!(matches!(err, PluginError::Query(_)));
    assert!(report.is_empty());
}

#[test]
fn test_invoke_sql_update_reports_update_count() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let params = Configuration::new().with("sql", "UPDATE t SET x=1").with("type", "update");
    let result = server.invoke_operation("invokeSql", &params).unwrap();

    assert_eq!(result.simple("result"), Some("Query updated 3 rows"));
    assert_eq!(result.simple("contents"), None);
}

#[test]
fn test_invoke_sql_query_renders_table() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let params = Configuration::new().with("sql", "SELECT a,b FROM t").with("type", "query");
    let result = server.invoke_operation("invokeSql", &params).unwrap();

    assert_eq!(result.simple("result"), Some("Query returned 2 rows"));
    assert_eq!(
        result.simple("contents"),
        Some(
            "<table><th><td>A (NUMBER)</td><td>B (VARCHAR2)</td></th>\
             <tr><td>1</td><td>one</td></tr><tr><td>2</td><td>null</td></tr></table>"
        )
    );
}

#[test]
fn test_invoke_sql_propagates_query_failure() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let params = Configuration::new().with("sql", "SELECT broken");
    let err = server.invoke_operation("invokeSql", &params).unwrap_err();
    assert!(err.to_string().contains("ORA-00942"));
}

#[test]
fn test_invoke_sql_requires_sql_parameter() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let err = server
        .invoke_operation("invokeSql", &Configuration::new().with("type", "update"))
        .unwrap_err();
    assert!(matches!(err, PluginError::Configuration(_)));
    assert!(connector.last_session().executed().is_empty());
}

#[test]
fn test_list_open_cursors_by_session() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let result = server
        .invoke_operation("listOpenCursorsBySession", &Configuration::new())
        .unwrap();
    let list = result.list("openCursorList").expect("list present");

    assert_eq!(list.len(), 1);
    let process = &list.items[0];
    assert_eq!(process.name, "process");
    assert_eq!(process.simple_value("sid"), Some("137"));
    assert_eq!(process.simple_value("userName"), Some("APP"));
    assert_eq!(process.simple_value("serialNum"), Some("4021"));
    assert_eq!(process.simple_value("numCursors"), Some("18"));
}

#[test]
fn test_list_open_cursors_by_user_by_machine() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let result = server
        .invoke_operation("listOpenCursorsByUserByMachine", &Configuration::new())
        .unwrap();
    let list = result.list("openCursorByUserList").expect("list present");

    assert_eq!(list.len(), 2);
    assert_eq!(list.items[0].name, "openCursorsByUser");
    assert_eq!(list.items[0].simple_value("userName"), Some("APP"));
    assert_eq!(list.items[0].simple_value("connectingServer"), Some("web-01"));
    assert_eq!(list.items[0].simple_value("numCursors"), Some("40"));
    assert_eq!(list.items[0].simple_value("avgCursors"), Some("10"));
    assert_eq!(list.items[0].simple_value("maxCursors"), Some("22"));
    assert_eq!(list.items[1].simple_value("userName"), None);

    let executed = connector.last_session().executed();
    assert!(executed[0].sql.contains("ORDER BY total_cur DESC"));
}

#[test]
fn test_list_cached_cursors_by_session() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let result = server
        .invoke_operation("listCachedCursorsBySession", &Configuration::new())
        .unwrap();
    let list = result.list("cachedCursorByUserList").expect("list present");

    assert_eq!(list.len(), 2);
    assert_eq!(list.items[1].name, "cachedCursorsByUser");
    assert_eq!(list.items[1].simple_value("userName"), Some("SYS"));
    assert_eq!(list.items[1].simple_value("sid"), Some("5"));
    assert_eq!(list.items[1].simple_value("serialNum"), Some("1"));
    assert_eq!(list.items[1].simple_value("numCursors"), Some("3"));
}

#[test]
fn test_view_session_cursors_cache_binds_sid() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let result = server
        .invoke_operation("viewSessionCursorsCache", &Configuration::new().with("sid", "137"))
        .unwrap();
    let list = result.list("sessionCursorCacheList").expect("list present");
    assert_eq!(list.items[0].name, "cachedCursorsBySession");
    assert_eq!(list.items[0].simple_value("sqlText"), Some("SELECT * FROM orders"));

    let executed = connector.last_session().executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].params, vec!["137".to_string()]);
    assert!(!executed[0].sql.contains("137"));
}

#[test]
fn test_view_session_cursors_cache_requires_sid() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let err = server
        .invoke_operation("viewSessionCursorsCache", &Configuration::new())
        .unwrap_err();
    assert!(matches!(err, PluginError::Configuration(_)));
}

#[test]
fn test_unknown_operation_is_unsupported() {
    let connector = FakeConnector::new(instance_script());
    let server = started(&connector);

    let err = server.invoke_operation("bogusOp", &Configuration::new()).unwrap_err();
    assert!(matches!(err, PluginError::UnsupportedOperation(ref name) if name == "bogusOp"));
    assert_eq!(err.to_string(), "Operation [bogusOp] is not supported yet.");
    assert!(connector.last_session().executed().is_empty());
}

#[test]
fn test_stop_closes_connection() {
    let connector = FakeConnector::new(instance_script());
    let mut server = started(&connector);
    let session = connector.last_session();

    server.stop();
    assert!(session.is_closed());
    assert_eq!(server.availability(), AvailabilityType::Down);

    server.stop();
}

#[test]
fn test_stop_swallows_close_failure() {
    let connector = FakeConnector::failing_close(instance_script());
    let mut server = started(&connector);

    server.stop();
    assert!(connector.last_session().is_closed());
}
