//! REST API for lvdb.
//!
//! One [`VecDB`] is built at startup and shared by every worker through
//! `web::Data`. Request bodies are read raw and parsed with `serde_json`, so a
//! malformed body gets a plain-text reply (status 200) rather than a
//! framework error.
//!
//! ## Endpoints
//!
//! - `POST /insert` - Insert one vector (`[1.0, 2.0]`)
//! - `POST /insert-batch` - Insert several vectors, best effort (`[[1.0], [2.0]]`)
//! - `POST /search` - KNN search (`{"query_vector": [...], "top_k": 5}`)
//! - `PUT /update/{id}` - Replace the values of a vector
//! - `DELETE /delete/{id}` - Delete a vector
//! - `GET /vectors` - List every vector
//! - `GET /vectors/{id}` - Fetch one vector
//! - `POST /cosine-similarity` - Compare exactly two vectors, store untouched
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use lvdb::VecDB;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let db = web::Data::new(VecDB::new());
//!     HttpServer::new(move || App::new().app_data(db.clone()).configure(lvdb::server::config))
//!         .bind("0.0.0.0:7878")?
//!         .run()
//!         .await
//! }
//! ```

use crate::config::ServerConfig;
use crate::error::DbError;
use crate::vector::cosine_similarity;
use crate::{SearchResult, VecDB};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

// --- Request structs ---

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(alias = "QueryVector")]
    query_vector: Vec<f64>,
    #[serde(alias = "TopK")]
    top_k: i64,
}

// --- Response structs ---

#[derive(Serialize)]
struct MatchResult {
    id: u64,
    values: Vec<f64>,
    score: f64,
}

impl From<SearchResult> for MatchResult {
    fn from(result: SearchResult) -> Self {
        MatchResult {
            id: result.record.id,
            values: result.record.values,
            score: result.score,
        }
    }
}

/// Plain-text reply for a core error. Caller mistakes stay at 200 like
/// malformed input does.
fn error_response(err: DbError) -> HttpResponse {
    match err {
        DbError::InvalidInput(_) | DbError::DimensionMismatch { .. } => {
            HttpResponse::Ok().body(err.to_string())
        }
        DbError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        DbError::Persistence(_) => {
            error!(error = %err, "persistence failure");
            HttpResponse::InternalServerError().body(err.to_string())
        }
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok()
}

// --- Handlers ---

async fn insert_handler(db: web::Data<VecDB>, body: web::Bytes) -> impl Responder {
    let Ok(values) = serde_json::from_slice::<Vec<f64>>(&body) else {
        return HttpResponse::Ok().body("Invalid vector data.");
    };

    match db.insert(values) {
        Ok(id) => HttpResponse::Ok().body(format!("Vector inserted successfully with id {}.", id)),
        Err(e) => error_response(e),
    }
}

async fn insert_batch_handler(db: web::Data<VecDB>, body: web::Bytes) -> impl Responder {
    let Ok(batch) = serde_json::from_slice::<Vec<Vec<f64>>>(&body) else {
        return HttpResponse::Ok().body("Invalid batch vector data.");
    };

    let mut inserted = 0;
    let mut failed = 0;

    for result in db.insert_batch(batch) {
        match result {
            Ok(_) => inserted += 1,
            Err(DbError::Persistence(e)) => {
                error!(error = %e, "batch element not persisted");
                failed += 1;
            }
            Err(e) => {
                debug!(error = %e, "batch element rejected");
                failed += 1;
            }
        }
    }

    HttpResponse::Ok().body(format!(
        "Batch vectors inserted successfully: {} inserted, {} failed.",
        inserted, failed
    ))
}

async fn search_handler(db: web::Data<VecDB>, body: web::Bytes) -> impl Responder {
    let Ok(request) = serde_json::from_slice::<SearchRequest>(&body) else {
        return HttpResponse::Ok().body("Invalid search data.");
    };

    // Negative counts ask for nothing
    let top_k = usize::try_from(request.top_k).unwrap_or(0);

    match db.search(&request.query_vector, top_k) {
        Ok(results) => {
            let matches: Vec<MatchResult> = results.into_iter().map(MatchResult::from).collect();
            HttpResponse::Ok().json(matches)
        }
        Err(e) => error_response(e),
    }
}

async fn update_handler(db: web::Data<VecDB>, path: web::Path<String>, body: web::Bytes) -> impl Responder {
    let Some(id) = parse_id(&path) else {
        return HttpResponse::Ok().body("Invalid vector id.");
    };
    let Ok(values) = serde_json::from_slice::<Vec<f64>>(&body) else {
        return HttpResponse::Ok().body("Invalid vector data.");
    };

    match db.update(id, values) {
        Ok(()) => HttpResponse::Ok().body("Vector updated successfully."),
        Err(e) => error_response(e),
    }
}

async fn delete_handler(db: web::Data<VecDB>, path: web::Path<String>) -> impl Responder {
    let Some(id) = parse_id(&path) else {
        return HttpResponse::Ok().body("Invalid vector id.");
    };

    match db.delete(id) {
        Ok(true) => HttpResponse::Ok().body("Vector deleted successfully."),
        Ok(false) => HttpResponse::Ok().body(format!("No vector with id {}; nothing deleted.", id)),
        Err(e) => error_response(e),
    }
}

async fn list_handler(db: web::Data<VecDB>) -> impl Responder {
    match db.get_all() {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => error_response(e),
    }
}

async fn get_handler(db: web::Data<VecDB>, path: web::Path<String>) -> impl Responder {
    let Some(id) = parse_id(&path) else {
        return HttpResponse::Ok().body("Invalid vector id.");
    };

    match db.get(id) {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(e),
    }
}

async fn cosine_similarity_handler(body: web::Bytes) -> impl Responder {
    let pair = match serde_json::from_slice::<Vec<Vec<f64>>>(&body) {
        Ok(vectors) if vectors.len() == 2 => vectors,
        _ => return HttpResponse::Ok().body("Please provide exactly two vectors."),
    };

    match cosine_similarity(&pair[0], &pair[1]) {
        Ok(similarity) => HttpResponse::Ok().body(format!("Cosine Similarity: {}", similarity)),
        Err(e) => error_response(e),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/insert").route(web::post().to(insert_handler)))
       .service(web::resource("/insert-batch").route(web::post().to(insert_batch_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)))
       .service(web::resource("/update/{id}").route(web::put().to(update_handler)))
       .service(web::resource("/delete/{id}").route(web::delete().to(delete_handler)))
       .service(web::resource("/vectors").route(web::get().to(list_handler)))
       .service(web::resource("/vectors/{id}").route(web::get().to(get_handler)))
       .service(web::resource("/cosine-similarity").route(web::post().to(cosine_similarity_handler)));
}


/// Serves `db` on the address in `settings` until the server is stopped.
pub async fn serve(settings: &ServerConfig, db: VecDB) -> std::io::Result<()> {
    let db = web::Data::new(db);
    let max_payload = settings.max_payload;

    info!(addr = %settings.bind_addr(), records = db.count(), "starting server");

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(web::PayloadConfig::new(max_payload))
            .configure(config)
    })
    .bind(settings.bind_addr())?
    .run()
    .await
}
