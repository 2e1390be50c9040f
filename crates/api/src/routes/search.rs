//! `POST /api/v1/manhwa/search` (§6).

use crate::error::ApiResult;
use actix_web::{web, HttpResponse};
use manhwa_catalogue::CatalogueService;
use manhwa_core::models::search::SearchParams;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::post().to(search));
}

async fn search(
    catalogue: web::Data<Arc<CatalogueService>>,
    body: web::Json<SearchParams>,
) -> ApiResult<HttpResponse> {
    let response = catalogue.search(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
