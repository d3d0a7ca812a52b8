//! Client operations against a canned server.
//!
//! `FakeServer` answers each request with a fixture chosen by the action
//! parameter of the URL and records every URL it was asked for.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::FixedOffset;
use chrono::NaiveDate;
use filemaker_lib::FileMakerClient;
use filemaker_lib::api::PageStrategy;
use filemaker_lib::api::query::Action;
use filemaker_lib::api::query::CompoundQuery;
use filemaker_lib::api::query::Criterion;
use filemaker_lib::api::query::SortOrder;
use filemaker_lib::config::ClientConfig;
use filemaker_lib::error::Error;
use filemaker_lib::error::RequestError;
use filemaker_lib::error::ValidationError;
use filemaker_lib::model::Value;
use filemaker_lib::transport::Requester;
use futures::StreamExt;
use url::Url;

const DBNAMES: &str = include_str!("fixtures/dbnames.xml");
const LAYOUT_NAMES: &str = include_str!("fixtures/layout_names.xml");
const SCRIPT_NAMES: &str = include_str!("fixtures/scriptnames.xml");
const FIELD_TYPES: &str = include_str!("fixtures/field_types.xml");
const RELATED: &str = include_str!("fixtures/related.xml");
const ERROR_101: &str = include_str!("fixtures/error_101.xml");

// =============================================================================
// Fake server
// =============================================================================

#[derive(Clone, Default)]
struct FakeServer {
    routes: HashMap<&'static str, Vec<u8>>,
    seen: Arc<Mutex<Vec<Url>>>,
}

impl FakeServer {
    fn route(mut self, action: &'static str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(action, body.into());
        self
    }

    fn requests(&self) -> Vec<Url> {
        self.seen.lock().unwrap().clone()
    }

    fn last_pairs(&self) -> Vec<(String, String)> {
        let requests = self.requests();
        let url = requests.last().expect("no request was sent");
        url.query_pairs().into_owned().collect()
    }
}

#[async_trait]
impl Requester for FakeServer {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, RequestError> {
        self.seen.lock().unwrap().push(url.clone());
        if url.path().starts_with("/fmi/xml/cnt/") {
            return Ok(b"%PDF-1.4".to_vec());
        }
        url.query_pairs()
            .find_map(|(key, _)| self.routes.get(key.as_ref()).cloned())
            .ok_or_else(|| RequestError::http(404, format!("no route for {}", url)))
    }
}

fn client(server: &FakeServer) -> FileMakerClient {
    client_with(server, ClientConfig::default())
}

fn client_with(server: &FakeServer, config: ClientConfig) -> FileMakerClient {
    FileMakerClient::builder()
        .url("https://fms.example.com")
        .database("TestFile")
        .layout("test_table1")
        .config(config)
        .requester(server.clone())
        .build()
        .unwrap()
}

fn pair<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// =============================================================================
// Names
// =============================================================================

#[tokio::test]
async fn test_database_names() {
    let server = FakeServer::default().route("-dbnames", DBNAMES);
    let names = client(&server).database_names().await.unwrap();
    assert_eq!(names, vec!["DB1", "D B2", "été"]);
}

#[tokio::test]
async fn test_layout_names() {
    let server = FakeServer::default().route("-layoutnames", LAYOUT_NAMES);
    let names = client(&server).layout_names().await.unwrap();
    assert_eq!(names, vec!["customers", "orders", "non âscïi Täßle ñame"]);

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-db"), Some("TestFile"));
}

#[tokio::test]
async fn test_script_names() {
    let server = FakeServer::default().route("-scriptnames", SCRIPT_NAMES);
    let names = client(&server).script_names().await.unwrap();
    assert_eq!(names, vec!["generate_dummy_data", "étoile mâtinée"]);
}

#[tokio::test]
async fn test_field_names_from_view() {
    let server = FakeServer::default().route("-view", RELATED);
    let names = client(&server).field_names().await.unwrap();
    assert_eq!(
        names,
        vec![
            "id",
            "name",
            "orders__orders::id",
            "orders__orders::placed",
            "orders__items::sku",
        ]
    );
}

// =============================================================================
// Find
// =============================================================================

#[tokio::test]
async fn test_find_sends_operator_suffixes() {
    let server = FakeServer::default().route("-find", FIELD_TYPES);
    let records: Vec<_> = client(&server)
        .find([("f_number__lt", Value::from(0.5)), ("owner__name", Value::from("Ada"))])
        .await
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "f_number"), Some("0.5"));
    assert_eq!(pair(&pairs, "f_number.op"), Some("lt"));
    assert_eq!(pair(&pairs, "owner::name"), Some("Ada"));
    assert_eq!(pair(&pairs, "-lop"), Some("and"));
    assert_eq!(pairs.last().map(|(k, _)| k.as_str()), Some("-find"));
}

#[tokio::test]
async fn test_find_with_timezone_converts_dates() {
    let zurich = FixedOffset::east_opt(2 * 3600).unwrap();
    let server = FakeServer::default().route("-find", FIELD_TYPES);
    let client = client_with(&server, ClientConfig::default().with_server_timezone(zurich));

    let utc = NaiveDate::from_ymd_opt(2018, 9, 12)
        .and_then(|d| d.and_hms_opt(19, 0, 0))
        .unwrap()
        .and_utc();
    client.find([("stamp__gt", utc)]).await.unwrap();

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "stamp"), Some("09/12/2018 21:00:00"));
    assert_eq!(pair(&pairs, "stamp.op"), Some("gt"));
}

#[tokio::test]
async fn test_find_any_returns_first_record() {
    let server = FakeServer::default().route("-findany", RELATED);
    let record = client(&server).find_any().await.unwrap().unwrap();
    assert_eq!(record.record_id(), Some("1"));
}

#[tokio::test]
async fn test_find_query() {
    let server = FakeServer::default().route("-findquery", RELATED);
    let compound = CompoundQuery::new()
        .with("name", Criterion::any_of(["Ada", "Bob"]))
        .with("!id", Criterion::value(3));
    client(&server).find_query(&compound).await.unwrap();

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-query"), Some("(q1);(q2);!(q3)"));
    assert_eq!(pair(&pairs, "-q1"), Some("name"));
    assert_eq!(pair(&pairs, "-q2.value"), Some("Bob"));
    assert_eq!(pair(&pairs, "-q3"), Some("id"));
    assert_eq!(pair(&pairs, "-q3.value"), Some("3"));
}

#[tokio::test]
async fn test_run_script_limits_to_one_record() {
    let server = FakeServer::default().route("-findall", RELATED);
    client(&server)
        .run_script("generate_dummy_data", Some("10"), false)
        .await
        .unwrap();

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-script"), Some("generate_dummy_data"));
    assert_eq!(pair(&pairs, "-script.param"), Some("10"));
    assert_eq!(pair(&pairs, "-max"), Some("1"));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_edit_sends_changed_fields_only() {
    let server = FakeServer::default()
        .route("-findany", RELATED)
        .route("-edit", RELATED);
    let client = client(&server);

    let mut record = client.find_any().await.unwrap().unwrap();
    record.insert("name", "Grace");
    client.edit(&record).await.unwrap();

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-recid"), Some("1"));
    assert_eq!(pair(&pairs, "-modid"), Some("5"));
    assert_eq!(pair(&pairs, "name"), Some("Grace"));
    assert_eq!(pair(&pairs, "id"), None);
}

#[tokio::test]
async fn test_edit_requires_record_id() {
    let server = FakeServer::default();
    let record = filemaker_lib::model::Record::new().set("name", "Grace");
    let err = client(&server).edit(&record).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingArgument { argument: "-recid", .. })
    ));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_delete_tolerates_missing_record() {
    let server = FakeServer::default().route("-delete", ERROR_101);
    let client = client(&server);

    client.delete("42", false).await.unwrap();

    let err = client.delete("42", true).await.unwrap_err();
    assert_eq!(err.server_code(), Some(101));
}

#[tokio::test]
async fn test_create_parses_field_paths() {
    let server = FakeServer::default().route("-new", RELATED);
    let created = client(&server)
        .create([("name", "Ada"), ("orders__id", "100")])
        .await
        .unwrap();
    assert!(created.is_some());

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "name"), Some("Ada"));
    assert_eq!(pair(&pairs, "orders::id"), Some("100"));
    assert_eq!(pair(&pairs, "orders__id"), None);
    assert_eq!(pairs.last().map(|(k, _)| k.as_str()), Some("-new"));
}

#[tokio::test]
async fn test_edit_fields_parses_field_paths() {
    let server = FakeServer::default().route("-edit", RELATED);
    client(&server)
        .edit_fields("1", [("owner__name", "Grace")])
        .await
        .unwrap();

    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-recid"), Some("1"));
    assert_eq!(pair(&pairs, "owner::name"), Some("Grace"));
}

// =============================================================================
// Containers
// =============================================================================

#[tokio::test]
async fn test_fetch_container() {
    let server = FakeServer::default();
    let container = client(&server)
        .fetch_container("/fmi/xml/cnt/report.pdf?-db=TestFile&-lay=test_table1&-recid=1&-field=f_container(1)")
        .await
        .unwrap();
    assert_eq!(container.name, "report");
    assert_eq!(container.extension, "pdf");
    assert_eq!(container.data, b"%PDF-1.4");

    let requests = server.requests();
    assert_eq!(requests[0].host_str(), Some("fms.example.com"));
}

#[tokio::test]
async fn test_fetch_container_rejects_other_paths() {
    let server = FakeServer::default();
    let err = client(&server)
        .fetch_container("/etc/passwd")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::ContainerUrl(_))));
    assert!(server.requests().is_empty());
}

// =============================================================================
// Errors and pagination
// =============================================================================

#[tokio::test]
async fn test_transport_errors_propagate() {
    let server = FakeServer::default();
    let err = client(&server).find_all().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Request(RequestError::Http { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_paginate_through_client() {
    let server = FakeServer::default().route("-findall", RELATED);
    let config = ClientConfig::default().with_page_strategy(PageStrategy::Sequential);
    let client = client_with(&server, config);

    let query = client.query(Action::FindAll).sort(&SortOrder::desc("id"));
    let mut stream = client.paginate(query, 10).unwrap();
    let mut ids = Vec::new();
    while let Some(record) = stream.next().await {
        ids.push(record.unwrap().record_id().map(String::from));
    }

    assert_eq!(ids, vec![Some("1".to_string()), Some("2".to_string())]);
    let pairs = server.last_pairs();
    assert_eq!(pair(&pairs, "-skip"), Some("0"));
    assert_eq!(pair(&pairs, "-max"), Some("10"));
    assert_eq!(pair(&pairs, "-sortfield.1"), Some("id"));
    assert_eq!(pair(&pairs, "-sortorder.1"), Some("descend"));
}

#[tokio::test]
async fn test_paginate_refuses_write_actions() {
    let server = FakeServer::default().route("-new", RELATED);
    let client = client(&server);

    let query = client.query(Action::New).param("name", "Ada").unwrap();
    let err = client.paginate(query, 1).err().unwrap();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NotPageable("-new"))
    ));
    assert!(server.requests().is_empty());
}

#[test]
fn test_paginate_outside_a_runtime() {
    let server = FakeServer::default().route("-findall", RELATED);
    let client = client(&server);

    let stream = client.paginate(client.query(Action::FindAll), 10).unwrap();
    drop(stream);
    assert!(server.requests().is_empty());
}
