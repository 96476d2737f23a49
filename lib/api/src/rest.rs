use crate::error::ApiError;
use actix_cors::Cors;
use actix_web::http::Uri;
use actix_web::{web, App, HttpResponse, HttpServer};
use compsift_core::{Candidate, Error, Measure, Subject, NOT_AVAILABLE};
use compsift_similarity::{CompRanker, RankedComp, RankingStats};
use compsift_storage::AppraisalSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

type ApiResult = Result<HttpResponse, ApiError>;

/// Shared, read-only state for every worker
pub struct AppState {
    pub source: AppraisalSource,
    pub ranker: CompRanker,
}

#[derive(Deserialize)]
struct CompsRequest {
    subject: Option<Value>,
    candidates: Option<Value>,
    top_n: Option<usize>,
    max_radius_miles: Option<f64>,
}

#[derive(Serialize)]
struct AppraisalEntry {
    id: String,
    address: String,
}

#[derive(Serialize)]
struct CandidatesResponse {
    subject: Value,
    candidates: Vec<Value>,
}

/// A number, or the "N/A" placeholder
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum Shown {
    Number(f64),
    Text(&'static str),
}

impl From<Measure> for Shown {
    fn from(m: Measure) -> Self {
        match m {
            Measure::Known(v) => Shown::Number(v),
            Measure::Unknown => Shown::Text(NOT_AVAILABLE),
        }
    }
}

impl From<Option<f64>> for Shown {
    fn from(v: Option<f64>) -> Self {
        v.map(Shown::Number).unwrap_or(Shown::Text(NOT_AVAILABLE))
    }
}

#[derive(Serialize)]
struct CompResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    address: String,
    close_price: Shown,
    close_date: String,
    gla: Shown,
    lot_size: Shown,
    /// Miles, rounded for display
    distance: f64,
    score: f64,
    price_per_sqft: Shown,
    reasons: Vec<String>,
}

impl From<RankedComp> for CompResult {
    fn from(comp: RankedComp) -> Self {
        let candidate = comp.candidate;
        let address = if candidate.property.address.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            candidate.property.address
        };
        Self {
            id: candidate.property.id,
            address,
            close_price: candidate.close_price.into(),
            close_date: candidate
                .close_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            gla: candidate.property.gla.into(),
            lot_size: candidate.property.lot_size.into(),
            distance: round2(comp.distance_miles),
            score: comp.score,
            price_per_sqft: comp.price_per_sqft.map(round2).into(),
            reasons: comp.reasons,
        }
    }
}

#[derive(Serialize)]
struct CompsResponse {
    comps: Vec<CompResult>,
    stats: RankingStats,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        state: Arc<AppState>,
        port: u16,
        cors_origin: Option<String>,
    ) -> std::io::Result<()> {
        let state = web::Data::from(state);

        HttpServer::new(move || {
            App::new()
                .wrap(cors_policy(cors_origin.as_deref()))
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// CORS policy for a configured origin; `None` or `"*"` allows any origin
pub fn cors_policy(origin: Option<&str>) -> Cors {
    let cors = match origin {
        Some(origin) if origin != "*" => Cors::default().allowed_origin(origin),
        _ => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

/// Check a `--cors-origin` value before any worker starts.
///
/// `"*"` means any origin and maps to `None`. Anything else must be a
/// `scheme://host[:port]` origin.
pub fn parse_cors_origin(raw: &str) -> Result<Option<String>, Error> {
    let raw = raw.trim();
    if raw == "*" {
        return Ok(None);
    }
    let uri: Uri = raw
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("invalid CORS origin '{}': {}", raw, e)))?;
    let bare = uri.path_and_query().map_or(true, |pq| pq.as_str() == "/" || pq.as_str().is_empty());
    if uri.scheme().is_none() || uri.authority().is_none() || !bare {
        return Err(Error::InvalidConfig(format!(
            "invalid CORS origin '{}': expected scheme://host[:port]",
            raw
        )));
    }
    Ok(Some(raw.trim_end_matches('/').to_string()))
}

/// Register the routes and the JSON error handler
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(Error::BadRequest(format!("malformed request body: {}", err))).into()
    });

    cfg.app_data(json_config)
        .route("/get_appraisal_ids", web::get().to(get_appraisal_ids))
        .route("/get_candidates/{appraisal_id}", web::get().to(get_candidates))
        .route("/get_comps", web::post().to(get_comps));
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn get_appraisal_ids(state: web::Data<AppState>) -> ApiResult {
    let appraisals = state.source.list().await?;
    info!(count = appraisals.len(), "listed appraisals");

    let entries: Vec<AppraisalEntry> = appraisals
        .into_iter()
        .map(|a| AppraisalEntry {
            id: a.id,
            address: a.address.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn get_candidates(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let appraisal_id = path.into_inner();

    let record = state.source.get(&appraisal_id).await.map_err(|e| {
        warn!(%appraisal_id, error = %e, "candidate lookup failed");
        e
    })?;
    info!(%appraisal_id, candidates = record.properties.len(), "candidates fetched");

    Ok(HttpResponse::Ok().json(CandidatesResponse {
        subject: record.subject,
        candidates: record.properties,
    }))
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn get_comps(state: web::Data<AppState>, req: web::Json<CompsRequest>) -> ApiResult {
    let req = req.into_inner();

    let subject = parse_subject(req.subject)?;
    let (candidates, malformed) = parse_candidates(req.candidates)?;
    if malformed > 0 {
        warn!(malformed, "skipped malformed candidate records");
    }

    let ranker = state.ranker.with_overrides(req.top_n, req.max_radius_miles)?;
    let mut ranking = ranker.rank(&subject, candidates)?;
    ranking.stats.candidates_count += malformed;
    ranking.stats.insufficient_data += malformed;

    info!(
        candidates = ranking.stats.candidates_count,
        comps = ranking.comps.len(),
        "comps ranked"
    );

    Ok(HttpResponse::Ok().json(CompsResponse {
        comps: ranking.comps.into_iter().map(CompResult::from).collect(),
        stats: ranking.stats,
    }))
}

fn parse_subject(raw: Option<Value>) -> Result<Subject, Error> {
    match raw {
        None | Some(Value::Null) => Err(Error::BadRequest("request body is missing 'subject'".to_string())),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|e| Error::BadRequest(format!("malformed subject: {}", e))),
        Some(_) => Err(Error::BadRequest("'subject' must be an object".to_string())),
    }
}

/// Parse candidates one by one; records that are not objects are skipped
fn parse_candidates(raw: Option<Value>) -> Result<(Vec<Candidate>, usize), Error> {
    let items = match raw {
        None | Some(Value::Null) => return Ok((Vec::new(), 0)),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(Error::BadRequest("'candidates' must be an array".to_string())),
    };

    let total = items.len();
    let candidates: Vec<Candidate> = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let malformed = total - candidates.len();
    Ok((candidates, malformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use compsift_similarity::RankerConfig;
    use compsift_storage::{AppraisalDataset, AppraisalRepository};
    use serde_json::json;

    fn dataset() -> AppraisalDataset {
        serde_json::from_value(json!({
            "appraisals": [
                {
                    "orderID": "4762597",
                    "subject": {
                        "address": "1 Main St",
                        "latitude": 40.0,
                        "longitude": -74.0,
                        "gla": "2,000 sqft",
                        "effective_date": "Apr/01/2025"
                    },
                    "properties": [
                        {"address": "2 Main St", "latitude": 40.007, "longitude": -74.0, "gla": "1,950"}
                    ],
                    "comps": []
                },
                {"orderID": 12, "subject": {"gla": 1500}}
            ]
        }))
        .unwrap()
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            source: AppraisalRepository::from_dataset(dataset()).into(),
            ranker: CompRanker::new(RankerConfig::default()).unwrap(),
        })
    }

    macro_rules! app {
        () => {
            actix_test::init_service(App::new().app_data(state()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_get_appraisal_ids() {
        let app = app!();
        let req = actix_test::TestRequest::get().uri("/get_appraisal_ids").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            json!([
                {"id": "4762597", "address": "1 Main St"},
                {"id": "12", "address": "N/A"}
            ])
        );
    }

    #[actix_web::test]
    async fn test_get_candidates_returns_raw_values() {
        let app = app!();
        let req = actix_test::TestRequest::get().uri("/get_candidates/4762597").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["subject"]["gla"], json!("2,000 sqft"));
        assert_eq!(body["candidates"][0]["gla"], json!("1,950"));
    }

    #[actix_web::test]
    async fn test_get_candidates_unknown_id() {
        let app = app!();
        let req = actix_test::TestRequest::get().uri("/get_candidates/nope").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["detail"], json!("appraisal 'nope' does not exist"));
    }

    #[actix_web::test]
    async fn test_get_comps() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .set_json(json!({
                "subject": {"address": "1 Main St", "latitude": 40.0, "longitude": -74.0, "gla": 2000},
                "candidates": [
                    {"address": "far", "latitude": 40.058, "longitude": -74.0, "gla": 2500, "close_price": "$510,000"},
                    {"address": "near", "latitude": 40.0072, "longitude": -74.0, "gla": "1,950 sqft", "close_price": "$390,000"},
                    {"address": "nowhere", "gla": 2000},
                    "not a record"
                ]
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        let comps = body["comps"].as_array().unwrap();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0]["address"], json!("near"));
        assert_eq!(comps[0]["distance"], json!(0.5));
        assert_eq!(comps[0]["gla"], json!(1950.0));
        assert_eq!(comps[0]["close_price"], json!(390000.0));
        assert_eq!(comps[0]["price_per_sqft"], json!(200.0));
        assert_eq!(comps[0]["close_date"], json!("N/A"));
        assert_eq!(comps[0]["reasons"][0], json!("Within 0.5 miles"));
        assert_eq!(body["stats"]["candidates_count"], json!(4));
        assert_eq!(body["stats"]["invalid_coordinates"], json!(1));
        assert_eq!(body["stats"]["insufficient_data"], json!(1));
    }

    #[actix_web::test]
    async fn test_get_comps_top_n_override() {
        let app = app!();
        let candidates: Vec<Value> = (0..5)
            .map(|i| json!({"address": format!("{}", i), "latitude": 40.0 + 0.001 * i as f64, "longitude": -74.0, "gla": 2000}))
            .collect();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .set_json(json!({
                "subject": {"latitude": 40.0, "longitude": -74.0, "gla": 2000},
                "candidates": candidates,
                "top_n": 4
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["comps"].as_array().unwrap().len(), 4);
    }

    #[actix_web::test]
    async fn test_get_comps_missing_subject() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .set_json(json!({"candidates": []}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["detail"], json!("request body is missing 'subject'"));
    }

    #[actix_web::test]
    async fn test_get_comps_malformed_body() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().starts_with("malformed request body"));
    }

    #[actix_web::test]
    async fn test_get_comps_subject_without_location() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .set_json(json!({"subject": {"gla": 2000}, "candidates": []}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_get_comps_no_coordinates_is_empty() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/get_comps")
            .set_json(json!({
                "subject": {"latitude": 40.0, "longitude": -74.0, "gla": 2000},
                "candidates": [{"address": "a", "gla": 1900}, {"address": "b", "gla": 2100}]
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["comps"], json!([]));
    }

    #[actix_web::test]
    async fn test_cors_origin_restriction() {
        let app = actix_test::init_service(
            App::new()
                .wrap(cors_policy(Some("https://appraiser.example")))
                .app_data(state())
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/get_appraisal_ids")
            .insert_header(("Origin", "https://appraiser.example"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "https://appraiser.example"
        );

        let req = actix_test::TestRequest::get()
            .uri("/get_appraisal_ids")
            .insert_header(("Origin", "https://elsewhere.example"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }

    #[actix_web::test]
    async fn test_wildcard_origin_allows_any() {
        let app = actix_test::init_service(
            App::new().wrap(cors_policy(Some("*"))).app_data(state()).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/get_appraisal_ids")
            .insert_header(("Origin", "https://anywhere.example"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_parse_cors_origin() {
        assert_eq!(parse_cors_origin("*").unwrap(), None);
        assert_eq!(
            parse_cors_origin("https://appraiser.example").unwrap().as_deref(),
            Some("https://appraiser.example")
        );
        assert_eq!(
            parse_cors_origin("http://localhost:3000/").unwrap().as_deref(),
            Some("http://localhost:3000")
        );
        assert!(matches!(parse_cors_origin("appraiser.example"), Err(Error::InvalidConfig(_))));
        assert!(matches!(parse_cors_origin("https://a.example/app"), Err(Error::InvalidConfig(_))));
        assert!(matches!(parse_cors_origin("not an origin"), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_shown_serialization() {
        assert_eq!(serde_json::to_value(Shown::from(Measure::Unknown)).unwrap(), json!("N/A"));
        assert_eq!(serde_json::to_value(Shown::from(Some(1.5))).unwrap(), json!(1.5));
        assert_eq!(round2(0.4999), 0.5);
    }
}
