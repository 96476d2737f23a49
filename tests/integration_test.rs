// Integration tests for CompSift
use actix_web::{test as actix_test, web, App};
use compsift::backtest;
use compsift_api::{configure, AppState};
use compsift_core::{distance_miles, Candidate, Measure, Property, Subject};
use compsift_similarity::{CompRanker, RankerConfig};
use compsift_storage::{AppraisalDataset, AppraisalRepository, AppraisalSource};
use serde_json::{json, Value};

// One degree of latitude on the 3958.8 mile sphere
const MILES_PER_DEGREE: f64 = 69.0934;

fn north_of(lat: f64, miles: f64) -> f64 {
    lat + miles / MILES_PER_DEGREE
}

fn ranker() -> CompRanker {
    CompRanker::new(RankerConfig::default()).unwrap()
}

fn dataset() -> AppraisalDataset {
    serde_json::from_value(json!({
        "appraisals": [{
            "orderID": "4762597",
            "subject": {
                "address": "1 Main St",
                "latitude": 40.0,
                "longitude": -74.0,
                "gla": "2,000 sqft",
                "effective_date": "Apr/11/2025"
            },
            "properties": [
                {"address": "12 Oak St", "latitude": north_of(40.0, 0.5), "longitude": -74.0, "gla": 1950,
                 "close_price": "500,000", "close_date": "2025-03-01"},
                {"address": "40 Elm Ave", "latitude": north_of(40.0, 4.0), "longitude": -74.0, "gla": 2500,
                 "close_price": "650,000", "close_date": "2025-02-01"}
            ],
            "comps": [{"address": "12 oak st"}]
        }]
    }))
    .unwrap()
}

#[test]
fn test_nearer_similar_candidate_ranks_first() {
    let subject = Subject::new(Property::new("1 Main St").at(40.0, -74.0).with_gla(2000.0));
    let candidates = vec![
        Candidate::new(Property::new("far").at(north_of(40.0, 4.0), -74.0).with_gla(2500.0)),
        Candidate::new(Property::new("near").at(north_of(40.0, 0.5), -74.0).with_gla(1950.0)),
    ];

    let ranking = ranker().rank(&subject, candidates).unwrap();

    assert_eq!(ranking.comps.len(), 2);
    assert_eq!(ranking.comps[0].candidate.property.address, "near");
    assert!(ranking.comps[0].score < ranking.comps[1].score);
    assert!((ranking.comps[0].distance_miles - 0.5).abs() < 1e-3);
}

#[test]
fn test_candidates_without_coordinates_give_empty_result() {
    let subject = Subject::new(Property::new("1 Main St").at(40.0, -74.0).with_gla(2000.0));
    let candidates = vec![
        Candidate::new(Property::new("a").with_gla(2000.0)),
        Candidate::new(Property::new("b").with_gla(1800.0)),
    ];

    let ranking = ranker().rank(&subject, candidates).unwrap();

    assert!(ranking.comps.is_empty());
    assert_eq!(ranking.stats.candidates_count, 2);
    assert_eq!(ranking.stats.invalid_coordinates, 2);
}

#[test]
fn test_messy_fields_normalize_before_scoring() {
    let subject: Subject = serde_json::from_value(json!({
        "address": "1 Main St",
        "latitude": 40.0,
        "longitude": -74.0,
        "gla": 2000,
        "lot_size": 5000
    }))
    .unwrap();

    let messy: Candidate = serde_json::from_value(json!({
        "address": "12 Oak St",
        "latitude": 40.001,
        "longitude": -74.0,
        "gla": "1,800 sqft",
        "lot_size": ""
    }))
    .unwrap();
    assert_eq!(messy.property.gla, Measure::Known(1800.0));
    assert_eq!(messy.property.lot_size, Measure::Unknown);

    // A lot-size match would also contribute nothing; a very different lot must cost more
    let matching = Candidate::new(
        Property::new("matching lot").at(40.001, -74.0).with_gla(1800.0).with_lot_size(5000.0),
    );
    let different = Candidate::new(
        Property::new("different lot").at(40.001, -74.0).with_gla(1800.0).with_lot_size(20000.0),
    );

    let ranking = ranker()
        .rank(&subject, vec![messy, matching, different])
        .unwrap();
    let score_of = |address: &str| {
        ranking
            .comps
            .iter()
            .find(|c| c.candidate.property.address == address)
            .map(|c| c.score)
            .unwrap()
    };

    assert!((score_of("12 Oak St") - score_of("matching lot")).abs() < 1e-9);
    assert!(score_of("different lot") > score_of("12 Oak St"));

    let messy_reasons = &ranking
        .comps
        .iter()
        .find(|c| c.candidate.property.address == "12 Oak St")
        .unwrap()
        .reasons;
    assert!(messy_reasons.iter().any(|r| r.contains("lot size")));
}

#[test]
fn test_distance_is_symmetric_and_zero_on_self() {
    let points = [(40.0, -74.0), (34.05, -118.24), (-33.87, 151.21), (51.5, -0.12)];
    for &(lat1, lon1) in &points {
        assert_eq!(distance_miles(lat1, lon1, lat1, lon1).unwrap(), 0.0);
        for &(lat2, lon2) in &points {
            let there = distance_miles(lat1, lon1, lat2, lon2).unwrap();
            let back = distance_miles(lat2, lon2, lat1, lon1).unwrap();
            assert_eq!(there, back);
        }
    }
}

#[test]
fn test_ranking_is_deterministic() {
    let record = &dataset().appraisals[0];
    let subject: Subject = serde_json::from_value(record.subject.clone()).unwrap();
    let candidates: Vec<Candidate> = record
        .properties
        .iter()
        .map(|p| serde_json::from_value(p.clone()).unwrap())
        .collect();

    let first = ranker().rank(&subject, candidates.clone()).unwrap();
    let second = ranker().rank(&subject, candidates).unwrap();

    let summarize = |r: &compsift_similarity::Ranking| {
        r.comps
            .iter()
            .map(|c| (c.candidate.property.address.clone(), c.score, c.reasons.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summarize(&first), summarize(&second));
}

#[test]
fn test_dataset_file_backtest() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_vec(&dataset()).unwrap()).unwrap();

    let repository = AppraisalRepository::open(file.path()).unwrap();
    let report = backtest::run(&repository.records(), &ranker());

    assert_eq!(report.appraisals.len(), 1);
    assert_eq!(report.appraisals[0].matched, 1);
    assert_eq!(report.total_recorded(), 1);
    assert_eq!(report.recall(), 1.0);
}

fn app_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        source: AppraisalSource::from(AppraisalRepository::from_dataset(dataset())),
        ranker: ranker(),
    })
}

#[actix_web::test]
async fn test_unknown_appraisal_is_404_with_detail() {
    let app = actix_test::init_service(App::new().app_data(app_state()).configure(configure)).await;

    let req = actix_test::TestRequest::get()
        .uri("/get_candidates/does-not-exist")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    let body: Value = actix_test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("does-not-exist"));
}

#[actix_web::test]
async fn test_candidates_then_comps_round_trip() {
    let app = actix_test::init_service(App::new().app_data(app_state()).configure(configure)).await;

    let req = actix_test::TestRequest::get().uri("/get_appraisal_ids").to_request();
    let ids: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids[0]["id"], "4762597");

    let req = actix_test::TestRequest::get()
        .uri("/get_candidates/4762597")
        .to_request();
    let fetched: Value = actix_test::call_and_read_body_json(&app, req).await;

    let req = actix_test::TestRequest::post()
        .uri("/get_comps")
        .set_json(json!({"subject": fetched["subject"], "candidates": fetched["candidates"]}))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = actix_test::read_body_json(resp).await;
    let comps = body["comps"].as_array().unwrap();
    assert_eq!(comps.len(), 2);
    assert_eq!(comps[0]["address"], "12 Oak St");
    assert_eq!(comps[0]["distance"], 0.5);
    assert!(comps[0]["reasons"].as_array().map(|r| !r.is_empty()).unwrap());
}
