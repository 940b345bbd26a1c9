//! End-to-end API tests against a real PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p promoctl-server -- --ignored

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use promoctl_server::db::{create_pool, migrations};
use promoctl_server::{build_router, ServerConfig};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Distinct per call and per test process, so tests can share a database.
fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, nanos, n)
}

async fn setup() -> (Router, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool creation failed");
    migrations::run(&pool).await.expect("migrations failed");
    (build_router(pool.clone(), &ServerConfig::default()), pool)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn promoter_body(email: &str) -> Value {
    json!({
        "first_name": "Maude",
        "last_name": "Eichmann",
        "birthday_date": "1991-08-13",
        "gender": "male",
        "email": email,
        "phone": "(667) 889-1013",
        "availabilities": ["Sunday", "Monday"]
    })
}

async fn create_promoter(app: &Router) -> i64 {
    let email = format!("{}@example.org", unique("promoter"));
    let (status, body) = call(app, "POST", "/promoters", Some(promoter_body(&email))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["promoter"]["id"].as_i64().unwrap()
}

async fn create_skill(app: &Router) -> i64 {
    let (status, body) = call(
        app,
        "POST",
        "/skills",
        Some(json!({ "name": unique("skill") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["skill"]["id"].as_i64().unwrap()
}

async fn create_group(app: &Router, extra: Value) -> i64 {
    let mut payload = json!({ "name": unique("group") });
    if let (Some(target), Some(source)) = (payload.as_object_mut(), extra.as_object()) {
        target.extend(source.clone());
    }
    let (status, body) = call(app, "POST", "/promoter-groups", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["promoter_group"]["id"].as_i64().unwrap()
}

fn ids(list: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids
}

async fn group_skill_ids(app: &Router, group_id: i64) -> Vec<i64> {
    let (status, body) = call(app, "GET", &format!("/promoter-groups/{}", group_id), None).await;
    assert_eq!(status, StatusCode::OK);
    ids(&body["promoter_group"]["skills"])
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_email_is_rejected() {
    let (app, _pool) = setup().await;
    let email = format!("{}@example.org", unique("dup"));

    let (status, body) = call(&app, "POST", "/promoters", Some(promoter_body(&email))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["promoter"]["email"], email.as_str());

    let (status, body) = call(&app, "POST", "/promoters", Some(promoter_body(&email))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_keeping_own_email_is_allowed() {
    let (app, _pool) = setup().await;
    let email = format!("{}@example.org", unique("keep"));
    let (_, body) = call(&app, "POST", "/promoters", Some(promoter_body(&email))).await;
    let id = body["promoter"]["id"].as_i64().unwrap();

    let mut update = promoter_body(&email);
    update["first_name"] = json!("Maud");
    update["phone"] = Value::Null;
    let (status, body) = call(&app, "PUT", &format!("/promoters/{}", id), Some(update)).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["promoter"]["first_name"], "Maud");
    assert_eq!(body["promoter"]["phone"], Value::Null);
    assert_eq!(body["message"], "Promoter updated successfully");
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_skill_ids_clear_and_omitted_keep() {
    let (app, _pool) = setup().await;
    let s1 = create_skill(&app).await;
    let s2 = create_skill(&app).await;
    let group = create_group(&app, json!({ "skill_ids": [s1, s2] })).await;
    let uri = format!("/promoter-groups/{}", group);

    let (status, _) = call(&app, "PUT", &uri, Some(json!({ "name": unique("renamed") }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group_skill_ids(&app, group).await, vec![s1, s2]);

    let (status, body) = call(
        &app,
        "PUT",
        &uri,
        Some(json!({ "name": unique("renamed"), "skill_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["promoter_group"]["skills"], json!([]));
    assert!(group_skill_ids(&app, group).await.is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn sync_replaces_set_and_preserves_kept_links() {
    let (app, pool) = setup().await;
    let skills = [
        create_skill(&app).await,
        create_skill(&app).await,
        create_skill(&app).await,
        create_skill(&app).await,
    ];
    let group = create_group(&app, json!({ "skill_ids": &skills[..3] })).await;

    let link_ids = |pool: PgPool| async move {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM promoter_group_skill WHERE promoter_group_id = $1 ORDER BY skill_id",
        )
        .bind(group)
        .fetch_all(&pool)
        .await
        .unwrap()
    };
    let before = link_ids(pool.clone()).await;

    let payload = json!({ "name": unique("group"), "skill_ids": &skills[1..] });
    let uri = format!("/promoter-groups/{}", group);
    let (status, _) = call(&app, "PUT", &uri, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group_skill_ids(&app, group).await, skills[1..].to_vec());

    let after = link_ids(pool.clone()).await;
    // links for skills[1] and skills[2] kept their rows
    assert_eq!(&after[..2], &before[1..3]);

    // same set again changes nothing
    let (status, _) = call(&app, "PUT", &uri, Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(link_ids(pool).await, after);
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_reference_rejects_whole_write() {
    let (app, pool) = setup().await;
    let skill = create_skill(&app).await;
    let name = unique("orphan");

    let (status, body) = call(
        &app,
        "POST",
        "/promoter-groups",
        Some(json!({ "name": name, "skill_ids": [skill, i64::MAX] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["skill_ids.1"].is_array());
    assert!(body["errors"].get("skill_ids.0").is_none());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM promoter_groups WHERE name = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn deleting_promoter_cascades_links() {
    let (app, pool) = setup().await;
    let promoter = create_promoter(&app).await;
    let skill = create_skill(&app).await;
    create_group(&app, json!({ "promoter_ids": [promoter] })).await;

    let uri = format!("/promoters/{}", promoter);
    let (status, _) = call(
        &app,
        "POST",
        &format!("{}/skills", uri),
        Some(json!({ "skill_id": skill })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Promoter deleted successfully");

    for table in ["promoter_skill", "promoter_promoter_group"] {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE promoter_id = $1", table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(promoter)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "rows left in {}", table);
    }

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn attaching_unknown_skill_is_not_found() {
    let (app, _pool) = setup().await;
    let promoter = create_promoter(&app).await;
    let skill = create_skill(&app).await;
    let uri = format!("/promoters/{}/skills", promoter);

    let (status, _) = call(&app, "POST", &uri, Some(json!({ "skill_id": skill }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "POST", &uri, Some(json!({ "skill_id": i64::MAX }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, "GET", &format!("/promoters/{}", promoter), None).await;
    assert_eq!(ids(&body["promoter"]["skills"]), vec![skill]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn attaching_same_skill_twice_is_rejected() {
    let (app, _pool) = setup().await;
    let promoter = create_promoter(&app).await;
    let skill = create_skill(&app).await;
    let uri = format!("/promoters/{}/skills", promoter);

    let (status, body) = call(&app, "POST", &uri, Some(json!({ "skill_id": skill }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["promoter"]["skills"]), vec![skill]);

    let (status, body) = call(&app, "POST", &uri, Some(json!({ "skill_id": skill }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["skill_id"].is_array());
}

#[tokio::test]
#[ignore = "requires database"]
async fn skill_created_with_group_is_readable() {
    let (app, _pool) = setup().await;
    let group = create_group(&app, json!({})).await;

    let (status, body) = call(
        &app,
        "POST",
        "/skills",
        Some(json!({
            "name": "Lighting",
            "description": "Stage and booth lighting",
            "promoter_group_ids": [group]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ids(&body["skill"]["promoter_groups"]), vec![group]);
    let skill = body["skill"]["id"].as_i64().unwrap();

    let (status, body) = call(&app, "GET", &format!("/skills/{}", skill), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["skill"]["promoter_groups"]), vec![group]);

    let (_, body) = call(&app, "GET", &format!("/promoter-groups/{}", group), None).await;
    assert!(ids(&body["promoter_group"]["skills"]).contains(&skill));
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_resources_are_404() {
    let (app, _pool) = setup().await;
    for uri in ["/promoters/0", "/promoter-groups/0", "/skills/0"] {
        let (status, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["ok"], false);

        let (status, _) = call(&app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

async fn link_count(pool: &PgPool, table: &str, column: &str, id: i64) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, column);
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

#[tokio::test]
#[ignore = "requires database"]
async fn field_and_reference_errors_are_reported_together() {
    let (app, _pool) = setup().await;

    let (status, body) = call(
        &app,
        "POST",
        "/promoter-groups",
        Some(json!({ "name": "", "skill_ids": [i64::MAX] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "name is required");
    assert!(body["errors"]["skill_ids.0"].is_array(), "{}", body);

    let skill = create_skill(&app).await;
    let (status, body) = call(
        &app,
        "PUT",
        &format!("/skills/{}", skill),
        Some(json!({
            "name": "  ",
            "description": "d".repeat(1001),
            "promoter_group_ids": [i64::MAX]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let keys: Vec<&str> = body["errors"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["description", "name", "promoter_group_ids.0"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn deleting_skill_cascades_links() {
    let (app, pool) = setup().await;
    let promoter = create_promoter(&app).await;
    let skill = create_skill(&app).await;
    let group = create_group(&app, json!({ "skill_ids": [skill] })).await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/promoters/{}/skills", promoter),
        Some(json!({ "skill_id": skill })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/skills/{}", skill);
    let (status, body) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    assert_eq!(link_count(&pool, "promoter_skill", "skill_id", skill).await, 0);
    assert_eq!(link_count(&pool, "promoter_group_skill", "skill_id", skill).await, 0);

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(group_skill_ids(&app, group).await.is_empty());
    let (_, body) = call(&app, "GET", &format!("/promoters/{}", promoter), None).await;
    assert_eq!(body["promoter"]["skills"], json!([]));
}

#[tokio::test]
#[ignore = "requires database"]
async fn deleting_group_cascades_links() {
    let (app, pool) = setup().await;
    let promoter = create_promoter(&app).await;
    let skill = create_skill(&app).await;
    let group = create_group(
        &app,
        json!({ "promoter_ids": [promoter], "skill_ids": [skill] }),
    )
    .await;

    let uri = format!("/promoter-groups/{}", group);
    let (status, _) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        link_count(&pool, "promoter_promoter_group", "promoter_group_id", group).await,
        0
    );
    assert_eq!(
        link_count(&pool, "promoter_group_skill", "promoter_group_id", group).await,
        0
    );

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = call(&app, "GET", &format!("/promoters/{}", promoter), None).await;
    assert_eq!(body["promoter"]["promoter_groups"], json!([]));
    let (_, body) = call(&app, "GET", &format!("/skills/{}", skill), None).await;
    assert_eq!(body["skill"]["promoter_groups"], json!([]));
}

#[tokio::test]
#[ignore = "requires database"]
async fn skill_group_ids_empty_clear_and_omitted_keep() {
    let (app, _pool) = setup().await;
    let g1 = create_group(&app, json!({})).await;
    let g2 = create_group(&app, json!({})).await;

    let (status, body) = call(
        &app,
        "POST",
        "/skills",
        Some(json!({ "name": unique("skill"), "promoter_group_ids": [g1, g2] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/skills/{}", body["skill"]["id"].as_i64().unwrap());

    let (status, body) = call(&app, "PUT", &uri, Some(json!({ "name": unique("kept") }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["skill"]["promoter_groups"]), vec![g1, g2]);

    let (status, body) = call(
        &app,
        "PUT",
        &uri,
        Some(json!({ "name": unique("cleared"), "promoter_group_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skill"]["promoter_groups"], json!([]));

    let (_, body) = call(&app, "GET", &uri, None).await;
    assert_eq!(body["skill"]["promoter_groups"], json!([]));
}

#[tokio::test]
#[ignore = "requires database"]
async fn group_promoter_ids_are_synced() {
    let (app, _pool) = setup().await;
    let p1 = create_promoter(&app).await;
    let p2 = create_promoter(&app).await;
    let p3 = create_promoter(&app).await;
    let group = create_group(&app, json!({ "promoter_ids": [p1, p2] })).await;
    let uri = format!("/promoter-groups/{}", group);

    let (status, body) = call(
        &app,
        "PUT",
        &uri,
        Some(json!({ "name": unique("group"), "promoter_ids": [p2, p3] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["promoter_group"]["promoters"]), vec![p2, p3]);

    let (_, body) = call(&app, "GET", &format!("/promoters/{}", p1), None).await;
    assert_eq!(body["promoter"]["promoter_groups"], json!([]));
    let (_, body) = call(&app, "GET", &format!("/promoters/{}", p3), None).await;
    assert_eq!(ids(&body["promoter"]["promoter_groups"]), vec![group]);

    // omitted list keeps promoters
    let (_, body) = call(&app, "PUT", &uri, Some(json!({ "name": unique("group") }))).await;
    assert_eq!(ids(&body["promoter_group"]["promoters"]), vec![p2, p3]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_resource_wins_over_invalid_body() {
    let (app, _pool) = setup().await;
    let cases = [
        ("/promoters/0", json!({})),
        ("/promoter-groups/0", json!({ "name": "" })),
        ("/skills/0", json!({ "name": "", "promoter_group_ids": [i64::MAX] })),
    ];
    for (uri, payload) in cases {
        let (status, body) = call(&app, "PUT", uri, Some(payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["ok"], false);
    }

    let (status, _) = call(
        &app,
        "POST",
        "/promoters/0/skills",
        Some(json!({ "skill_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
