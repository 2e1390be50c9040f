pub mod admin;
pub mod manhwa;
pub mod search;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/manhwa")
            .configure(search::configure)
            .configure(admin::configure)
            .configure(manhwa::configure),
    );
}
