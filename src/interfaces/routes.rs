use actix_web::web;

use crate::handlers::home::home;

mod admin;
mod images;
mod query_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(admin::config_routes)
            .configure(images::config_routes)
    );

    cfg.configure(query_error::config_routes);
}
