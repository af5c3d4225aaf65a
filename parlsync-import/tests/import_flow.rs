// End-to-end import session tests over an in-memory store:
// - creation, update-in-place, idempotent re-import
// - natural-key reuse and alias mapping
// - per-record error isolation (skips and rollbacks)
// - stale-entity sweep and its suppression on failed sessions

use parlsync_import::db;
use parlsync_import::db::countries::save_country;
use parlsync_import::db::mandates::count_mandates_for;
use parlsync_import::db::representatives::{load_representative_by_remote_id, Gender};
use parlsync_import::record::iter_dump_records;
use parlsync_import::{ImportError, ImportOrchestrator, ImportState, LookupTables};
use serde_json::json;
use sqlx::SqlitePool;

async fn setup_pool() -> SqlitePool {
    let pool = parlsync_common::db::init_memory_database()
        .await
        .expect("in-memory database");
    db::initialize_schema(&pool).await.expect("schema");

    // Reference data the importer refuses to create itself
    save_country(&pool, "Belgium", "BE").await.expect("Belgium");
    save_country(&pool, "France", "FR").await.expect("France");
    save_country(&pool, "Austria", "AT").await.expect("Austria");

    pool
}

fn orchestrator(pool: &SqlitePool) -> ImportOrchestrator {
    ImportOrchestrator::new(pool.clone(), LookupTables::builtin())
}

fn stream(records: Vec<serde_json::Value>) -> Vec<parlsync_common::Result<serde_json::Value>> {
    records.into_iter().map(Ok).collect()
}

/// A record exercising every resolver category at once
fn full_record(remote_id: &str, full_name: &str) -> serde_json::Value {
    json!({
        "UserID": remote_id,
        "Name": {"sur": "Jane", "family": "DOE", "full": full_name},
        "Gender": "F",
        "Birth": {"date": "1975-10-07T00:00:00", "place": "Lyon"},
        "CV": ["Economist", "Member of city council"],
        "Photo": "http://www.europarl.europa.eu/photo/jane_doe.jpg",
        "active": true,
        "Committees": [
            {"committee_id": "AGRI", "Organization": "Agriculture and Rural Development",
             "role": "Member", "start": "2014-07-01T00:00:00", "end": "2019-07-01T00:00:00"}
        ],
        "Delegations": [
            {"Organization": "Delegation for relations with Japan",
             "start": "2014-07-01T00:00:00", "end": "2019-07-01T00:00:00"}
        ],
        "Groups": [
            {"groupid": "S&D", "Organization": "Progressive Alliance of Socialists and Democrats",
             "role": "Member", "start": "2014-07-01T00:00:00", "end": "2019-07-01T00:00:00"}
        ],
        "Constituencies": [
            {"country": "France", "party": "Parti Socialiste",
             "start": "2014-07-01T00:00:00", "end": "2019-07-01T00:00:00"}
        ],
        "Staff": [
            {"Organization": "Bureau de liaison", "start": "2014-07-01T00:00:00"}
        ],
        "Addresses": {
            "Brussels": {"Address": {"Office": "04217"}, "Phone": "+32 2 28 45432"},
            "Strasbourg": {"Address": {"Office": "15G346"}, "Phone": "+33 3 88 17 5432"},
            "Postal": ["European Parliament", "60 rue Wiertz"]
        },
        "Mail": ["jane.doe@europarl.europa.eu", "jane@example.org"],
        "Homepage": ["http://janedoe.example.org"],
        "Twitter": ["https://twitter.com/janedoe"],
        "Facebook": ["https://facebook.com/janedoe"]
    })
}

async fn table_count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count")
}

#[tokio::test]
async fn test_minimal_record_creates_one_representative() {
    let pool = setup_pool().await;

    let session = orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "101",
            "Name": {"sur": "Jane", "family": "DOE", "full": "Jane DOE"},
            "active": true
        })]))
        .await
        .expect("session");

    assert_eq!(session.state, ImportState::Completed);
    assert_eq!(session.counts.processed, 1);
    assert_eq!(session.counts.skipped, 0);
    assert_eq!(session.counts.failed, 0);

    let mut conn = pool.acquire().await.expect("connection");
    let rep = load_representative_by_remote_id(&mut conn, "101")
        .await
        .expect("load")
        .expect("created");
    assert_eq!(rep.first_name, "Jane");
    assert_eq!(rep.last_name, "DOE");
    assert_eq!(rep.full_name, "Jane DOE");
    assert_eq!(rep.gender, Gender::Unknown);
    assert_eq!(rep.slug, "jane-doe");
    assert!(rep.active);

    let mandates = count_mandates_for(&mut conn, rep.guid).await.expect("count");
    assert_eq!(mandates, 0);
}

#[tokio::test]
async fn test_reimport_updates_in_place() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "101",
            "Name": {"sur": "Jane", "family": "DOE", "full": "Jane DOE"},
            "active": true
        })]))
        .await
        .expect("first session");

    orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "101",
            "Name": {"sur": "Jane", "family": "DOE", "full": "Jane DOE"},
            "active": false
        })]))
        .await
        .expect("second session");

    assert_eq!(table_count(&pool, "representatives").await, 1);

    let mut conn = pool.acquire().await.expect("connection");
    let rep = load_representative_by_remote_id(&mut conn, "101")
        .await
        .expect("load")
        .expect("still there");
    assert!(!rep.active, "row updated in place");
    assert_eq!(rep.remote_id, "101");
}

#[tokio::test]
async fn test_double_import_is_idempotent() {
    let pool = setup_pool().await;

    let records = vec![full_record("201", "Jane DOE"), full_record("202", "John ROE")];

    orchestrator(&pool)
        .run(stream(records.clone()))
        .await
        .expect("first session");

    let counts_after_first = (
        table_count(&pool, "representatives").await,
        table_count(&pool, "groups").await,
        table_count(&pool, "constituencies").await,
        table_count(&pool, "mandates").await,
        table_count(&pool, "addresses").await,
        table_count(&pool, "phones").await,
        table_count(&pool, "emails").await,
        table_count(&pool, "web_sites").await,
    );
    let fingerprint_first: String =
        sqlx::query_scalar("SELECT fingerprint FROM representatives WHERE remote_id = '201'")
            .fetch_one(&pool)
            .await
            .expect("fingerprint");

    let session = orchestrator(&pool)
        .run(stream(records))
        .await
        .expect("second session");
    assert_eq!(session.counts.processed, 2);
    assert_eq!(session.counts.swept, 0, "nothing went stale");

    let counts_after_second = (
        table_count(&pool, "representatives").await,
        table_count(&pool, "groups").await,
        table_count(&pool, "constituencies").await,
        table_count(&pool, "mandates").await,
        table_count(&pool, "addresses").await,
        table_count(&pool, "phones").await,
        table_count(&pool, "emails").await,
        table_count(&pool, "web_sites").await,
    );
    assert_eq!(counts_after_first, counts_after_second, "no duplicates on re-import");

    let fingerprint_second: String =
        sqlx::query_scalar("SELECT fingerprint FROM representatives WHERE remote_id = '201'")
            .fetch_one(&pool)
            .await
            .expect("fingerprint");
    assert_eq!(fingerprint_first, fingerprint_second);
}

#[tokio::test]
async fn test_shared_group_has_one_row() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![
            full_record("201", "Jane DOE"),
            full_record("202", "John ROE"),
        ]))
        .await
        .expect("session");

    // Both representatives sit on AGRI; one group row serves both
    let agri_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM groups WHERE kind = 'committee' AND abbreviation = 'AGRI'",
    )
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(agri_rows, 1);

    // ...and carries one mandate per representative
    let agri_mandates: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mandates WHERE group_id =
           (SELECT guid FROM groups WHERE kind = 'committee' AND abbreviation = 'AGRI')",
    )
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(agri_mandates, 2);
}

#[tokio::test]
async fn test_group_alias_is_canonicalized() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![full_record("201", "Jane DOE")]))
        .await
        .expect("session");

    let abbreviations: Vec<String> =
        sqlx::query_scalar("SELECT abbreviation FROM groups WHERE kind = 'group'")
            .fetch_all(&pool)
            .await
            .expect("abbreviations");
    assert_eq!(abbreviations, vec!["SD".to_string()]);
}

#[tokio::test]
async fn test_committee_without_id_is_skipped_but_siblings_import() {
    let pool = setup_pool().await;

    let session = orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "301",
            "Name": {"sur": "Ann", "family": "LEE", "full": "Ann LEE"},
            "active": true,
            "Committees": [{"Organization": "Committee with no id"}],
            "Delegations": [{"Organization": "Delegation for relations with Chile"}]
        })]))
        .await
        .expect("session");
    assert_eq!(session.counts.processed, 1);
    assert_eq!(session.counts.failed, 0);

    let committee_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE kind = 'committee'")
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(committee_rows, 0, "committee entry without id is dropped");

    let delegation_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE kind = 'delegation'")
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(delegation_rows, 1, "sibling delegation still imports");
    assert_eq!(table_count(&pool, "mandates").await, 1);
}

#[tokio::test]
async fn test_email_classification() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "401",
            "Name": {"sur": "Ann", "family": "LEE", "full": "Ann LEE"},
            "Mail": ["a@europarl.europa.eu", "b@example.com"]
        })]))
        .await
        .expect("session");

    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT kind, email FROM emails ORDER BY email")
            .fetch_all(&pool)
            .await
            .expect("emails");
    assert_eq!(
        rows,
        vec![
            ("official".to_string(), "a@europarl.europa.eu".to_string()),
            ("other".to_string(), "b@example.com".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_address_office_code_slicing() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![full_record("501", "Jane DOE")]))
        .await
        .expect("session");

    let (floor, office_number): (String, String) = sqlx::query_as(
        "SELECT floor, office_number FROM addresses WHERE city = 'Brussels'",
    )
    .fetch_one(&pool)
    .await
    .expect("Brussels address");
    assert_eq!(floor, "042");
    assert_eq!(office_number, "17");

    // Both seats recognized, the Postal entry ignored
    assert_eq!(table_count(&pool, "addresses").await, 2);
    assert_eq!(table_count(&pool, "phones").await, 2);

    let phone_links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM phones WHERE address_id IS NOT NULL")
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(phone_links, 2, "each office phone is scoped to its address");
}

#[tokio::test]
async fn test_record_without_remote_id_is_skipped() {
    let pool = setup_pool().await;

    let session = orchestrator(&pool)
        .run(stream(vec![
            json!({"Name": {"sur": "No", "family": "ID", "full": "No ID"}}),
            json!({"UserID": "601", "Name": {"full": "Has ID"}}),
        ]))
        .await
        .expect("session");

    assert_eq!(session.state, ImportState::Completed);
    assert_eq!(session.counts.skipped, 1);
    assert_eq!(session.counts.processed, 1);
    assert_eq!(table_count(&pool, "representatives").await, 1);
}

#[tokio::test]
async fn test_unknown_country_fails_record_and_rolls_back() {
    let pool = setup_pool().await;

    let session = orchestrator(&pool)
        .run(stream(vec![
            json!({
                "UserID": "701",
                "Name": {"sur": "Lost", "family": "LAND", "full": "Lost LAND"},
                "Constituencies": [{"country": "Atlantis", "party": "X"}]
            }),
            json!({"UserID": "702", "Name": {"full": "Jane FINE"}}),
        ]))
        .await
        .expect("session survives reference-data gap");

    assert_eq!(session.counts.failed, 1);
    assert_eq!(session.counts.processed, 1);

    // The failed record's transaction rolled back entirely
    let mut conn = pool.acquire().await.expect("connection");
    assert!(load_representative_by_remote_id(&mut conn, "701")
        .await
        .expect("load")
        .is_none());
    assert!(load_representative_by_remote_id(&mut conn, "702")
        .await
        .expect("load")
        .is_some());
}

#[tokio::test]
async fn test_malformed_date_fails_record() {
    let pool = setup_pool().await;

    let session = orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "801",
            "Name": {"full": "Bad DATE"},
            "Committees": [{
                "committee_id": "AGRI",
                "Organization": "Agriculture",
                "start": "July 2014"
            }]
        })]))
        .await
        .expect("session");

    assert_eq!(session.counts.failed, 1);
    assert_eq!(session.counts.processed, 0);
    assert_eq!(table_count(&pool, "representatives").await, 0);
}

#[tokio::test]
async fn test_sweep_removes_representatives_absent_from_next_dump() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![
            full_record("201", "Jane DOE"),
            full_record("202", "John ROE"),
        ]))
        .await
        .expect("dump N");

    let session = orchestrator(&pool)
        .run(stream(vec![full_record("201", "Jane DOE")]))
        .await
        .expect("dump N+1");
    assert!(session.counts.swept > 0);

    let mut conn = pool.acquire().await.expect("connection");
    assert!(load_representative_by_remote_id(&mut conn, "202")
        .await
        .expect("load")
        .is_none());
    let survivor = load_representative_by_remote_id(&mut conn, "201")
        .await
        .expect("load")
        .expect("still present");
    drop(conn);

    // 202's exclusively-owned rows went with it
    for table in ["mandates", "emails", "web_sites", "addresses", "phones"] {
        let orphans: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE representative_id NOT IN
               (SELECT guid FROM representatives)",
            table
        ))
        .fetch_one(&pool)
        .await
        .expect("orphan count");
        assert_eq!(orphans, 0, "{} should carry no orphans", table);
    }

    // Shared entities referenced by the survivor stayed put
    let mut conn = pool.acquire().await.expect("connection");
    let survivor_mandates = count_mandates_for(&mut conn, survivor.guid)
        .await
        .expect("count");
    assert_eq!(survivor_mandates, 5);
}

#[tokio::test]
async fn test_stream_failure_aborts_without_sweep() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![full_record("201", "Jane DOE")]))
        .await
        .expect("seed session");

    let result = orchestrator(&pool)
        .run(vec![
            Ok(full_record("202", "John ROE")),
            Err(parlsync_common::Error::InvalidInput(
                "undecodable dump line".to_string(),
            )),
        ])
        .await;
    assert!(matches!(result, Err(ImportError::Stream(_))));

    // The sweep did not run: the seeded representative was never reached
    // by the failed pass but must survive
    let mut conn = pool.acquire().await.expect("connection");
    assert!(load_representative_by_remote_id(&mut conn, "201")
        .await
        .expect("load")
        .is_some());
    drop(conn);

    // Committed records of the failed pass remain committed
    let mut conn = pool.acquire().await.expect("connection");
    assert!(load_representative_by_remote_id(&mut conn, "202")
        .await
        .expect("load")
        .is_some());
    drop(conn);

    let failed_sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM import_sessions WHERE state = 'FAILED'")
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(failed_sessions, 1);
}

#[tokio::test]
async fn test_import_from_framed_dump_text() {
    let pool = setup_pool().await;

    let dump = format!(
        "[{}\n,\n{}]\n",
        json!({"UserID": "901", "Name": {"full": "Framed ONE"}}),
        json!({"UserID": "902", "Name": {"full": "Framed TWO"}}),
    );

    let session = orchestrator(&pool)
        .run(iter_dump_records(dump.as_bytes()))
        .await
        .expect("session");

    assert_eq!(session.counts.processed, 2);
    assert_eq!(table_count(&pool, "representatives").await, 2);
}

#[tokio::test]
async fn test_name_correction_applies_on_import() {
    let pool = setup_pool().await;

    orchestrator(&pool)
        .run(stream(vec![json!({
            "UserID": "911",
            "Name": {"sur": "Esther", "family": "LANGE", "full": "Esther de LANGE"}
        })]))
        .await
        .expect("session");

    let mut conn = pool.acquire().await.expect("connection");
    let rep = load_representative_by_remote_id(&mut conn, "911")
        .await
        .expect("load")
        .expect("created");
    assert_eq!(rep.last_name, "de LANGE");
    assert_eq!(rep.slug, "esther-de-lange");
}
