//! Admin-prefixed endpoints under `/api/v1/manhwa/admin` (§6): catalogue
//! writes, manual sync control, and cache introspection. Role enforcement
//! lives outside this service (§9 "role checks are an external concern");
//! [`RoleGuard`] is a documented seam for wiring an auth layer in front of
//! this scope.

use crate::error::ApiResult;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use manhwa_catalogue::{CatalogueService, CreateManhwaDto};
use serde::Deserialize;
use std::future::{ready, Ready};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RoleGuard)
            .route("", web::post().to(create))
            .route("/import", web::post().to(import))
            .route("/{id}/refresh", web::post().to(refresh))
            .route("/cache/status", web::get().to(cache_status))
            .route("/cache/clear", web::post().to(cache_clear))
            .route("/sync/all", web::post().to(sync_all))
            .route("/sync/status", web::get().to(sync_status))
            .route("/sync/{id}", web::post().to(sync_one)),
    );
}

/// No-op today: the deployment fronting this service is expected to have
/// already authenticated the caller and attached a role claim before the
/// request reaches here. Kept as a real `Transform` rather than a comment so
/// a future auth check has a slot to land in without touching route wiring.
pub struct RoleGuard;

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGuardMiddleware { service }))
    }
}

pub struct RoleGuardMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RoleGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

async fn create(
    catalogue: web::Data<Arc<CatalogueService>>,
    body: web::Json<CreateManhwaDto>,
) -> ApiResult<HttpResponse> {
    let manhwa = catalogue.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(manhwa))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportBody {
    upstream_id: String,
}

async fn import(
    catalogue: web::Data<Arc<CatalogueService>>,
    body: web::Json<ImportBody>,
) -> ApiResult<HttpResponse> {
    let manhwa = catalogue.import(&body.upstream_id).await?;
    Ok(HttpResponse::Created().json(manhwa))
}

async fn refresh(
    catalogue: web::Data<Arc<CatalogueService>>,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let manhwa = catalogue.refresh(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(manhwa))
}

async fn cache_status(catalogue: web::Data<Arc<CatalogueService>>) -> HttpResponse {
    let cache = catalogue.cache();
    HttpResponse::Ok().json(serde_json::json!({
        "entity": stats_json(cache.entity.stats().await),
        "search": stats_json(cache.search.stats().await),
        "tag": stats_json(cache.tag.stats().await),
    }))
}

fn stats_json(stats: manhwa_cache::CacheStats) -> serde_json::Value {
    serde_json::json!({
        "hits": stats.hits,
        "misses": stats.misses,
        "keyCount": stats.key_count,
    })
}

#[derive(Debug, Deserialize)]
struct CacheClearBody {
    pattern: String,
}

async fn cache_clear(
    catalogue: web::Data<Arc<CatalogueService>>,
    body: web::Json<CacheClearBody>,
) -> HttpResponse {
    let cache = catalogue.cache();
    let mut removed = 0u64;
    removed += cache.entity.delete_matching(&body.pattern).await;
    removed += cache.search.delete_matching(&body.pattern).await;
    removed += cache.tag.delete_matching(&body.pattern).await;
    HttpResponse::Ok().json(serde_json::json!({ "removed": removed }))
}

async fn sync_one(
    catalogue: web::Data<Arc<CatalogueService>>,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    catalogue.enqueue_sync(id.into_inner()).await?;
    Ok(HttpResponse::Accepted().finish())
}

async fn sync_all(catalogue: web::Data<Arc<CatalogueService>>) -> ApiResult<HttpResponse> {
    let enqueued = catalogue.kick_full_sync().await?;
    Ok(HttpResponse::Accepted().json(serde_json::json!({ "enqueued": enqueued })))
}

async fn sync_status(catalogue: web::Data<Arc<CatalogueService>>) -> HttpResponse {
    let status = catalogue.syncer().status();
    HttpResponse::Ok().json(serde_json::json!({
        "queueLength": status.queue_length,
        "isProcessing": status.is_processing,
        "items": status.items.iter().map(|item| serde_json::json!({
            "id": item.id,
            "priority": item.priority,
            "retries": item.retries,
        })).collect::<Vec<_>>(),
    }))
}
