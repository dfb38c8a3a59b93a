use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Geotagged photo API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "list": "GET /api/v1/images?includeImage=&bounds=&radius=",
            "upload": "POST /api/v1/images?lat=&lng=&origin=&timestamp=",
            "health": "GET /api/v1/admin/health"
        }
    }))
}
