use std::time::Instant;

use actix_web::{get, post, web, HttpResponse, Responder};
use log::{error, info};
use serde_json::{json, Value};

use crate::error::{json_error_handler, ScoringError};
use crate::models::{ApiResponse, FeatureRecord, FeatureRow, ModelInfo};
use crate::AppState;

#[get("/api/")]
pub async fn read_root() -> impl Responder {
    HttpResponse::Ok().json(json!({ "API": "Coimbra" }))
}

/// Scores one feature record. The body is the prediction's string form.
#[post("/api/Model/")]
pub async fn score_model(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, actix_web::Error> {
    let start_time = Instant::now();
    let record = FeatureRecord::from_json(body.into_inner())?;
    let row = FeatureRow::from(&record);

    let scoring_state = state.clone();
    let outcome = web::block(move || scoring_state.store.score(&row))
        .await
        .map_err(|e| ScoringError::Blocking(e.to_string()))
        .and_then(|scored| scored);

    match outcome {
        Ok(prediction) => {
            info!(
                "prediction {} in {} ms",
                prediction,
                start_time.elapsed().as_millis()
            );
            Ok(HttpResponse::Ok().json(prediction.to_string()))
        }
        Err(e) => {
            error!("scoring failed: {}", e);
            Err(e.into())
        }
    }
}

#[get("/api/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success("ok"))
}

/// Describes the configured artifact without loading it. The file check
/// runs on the blocking pool.
#[get("/api/model-info")]
pub async fn model_info(state: web::Data<AppState>) -> Result<HttpResponse, actix_web::Error> {
    let info = web::block(move || ModelInfo::describe(state.store.path(), state.store.policy()))
        .await
        .map_err(|e| ScoringError::Blocking(e.to_string()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(info)))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("endpoint not found"))
}

pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(json_error_handler)
}

/// Registers the API routes and the JSON extractor configuration.
pub fn configure(json_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config(json_limit))
            .service(read_root)
            .service(score_model)
            .service(health)
            .service(model_info);
    }
}
