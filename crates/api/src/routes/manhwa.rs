//! Core read endpoints under `/api/v1/manhwa` (§6): entity lookup, bulk
//! lookup, trending/recent listings, and the genre dictionary.

use crate::error::ApiResult;
use actix_web::{web, HttpResponse};
use manhwa_catalogue::CatalogueService;
use serde::Deserialize;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // actix-web matches resources in registration order with no
    // most-specific-wins rule, so the literal siblings must come before
    // the bare `/{id}` catch-all or `/trending` etc. would match it instead.
    cfg.route("/bulk", web::post().to(bulk_get))
        .route("/trending", web::get().to(trending))
        .route("/recent", web::get().to(recent))
        .route("/genres", web::get().to(genres))
        .route("/{id}", web::get().to(get_by_id));
}

#[derive(Debug, Deserialize)]
struct RefreshQuery {
    #[serde(default)]
    refresh: bool,
}

async fn get_by_id(
    catalogue: web::Data<Arc<CatalogueService>>,
    id: web::Path<i64>,
    query: web::Query<RefreshQuery>,
) -> ApiResult<HttpResponse> {
    let manhwa = catalogue.get_by_id(id.into_inner(), query.refresh).await?;
    Ok(HttpResponse::Ok().json(manhwa))
}

#[derive(Debug, Deserialize)]
struct BulkGetBody {
    ids: Vec<i64>,
}

async fn bulk_get(
    catalogue: web::Data<Arc<CatalogueService>>,
    body: web::Json<BulkGetBody>,
) -> ApiResult<HttpResponse> {
    let result = catalogue.bulk_get(&body.ids).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "entities": result.entities,
        "notFound": result.not_found,
    })))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

async fn trending(
    catalogue: web::Data<Arc<CatalogueService>>,
    query: web::Query<LimitQuery>,
) -> ApiResult<HttpResponse> {
    let limit = query.limit.unwrap_or(20).min(100);
    let results = catalogue.trending(limit).await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn recent(
    catalogue: web::Data<Arc<CatalogueService>>,
    query: web::Query<LimitQuery>,
) -> ApiResult<HttpResponse> {
    let limit = query.limit.unwrap_or(20).min(100);
    let results = catalogue.recently_added(limit).await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn genres(catalogue: web::Data<Arc<CatalogueService>>) -> ApiResult<HttpResponse> {
    let genres = catalogue.list_genres().await?;
    Ok(HttpResponse::Ok().json(genres))
}
