use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
    middleware::Next,
    web,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::flow::{self, AnswerSet, ContactInfo, FlowError};
use crate::store::CatalogStore;

/// Body of `POST /api/categories/{id}/flow/next`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRequest {
    pub current_step_id: String,
    #[serde(default)]
    pub answers: AnswerSet,
    /// Contact details; only consulted on the terminal step.
    #[serde(default)]
    pub contact: ContactInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextResponse {
    pub next: flow::Next,
    pub progress: u32,
    pub valid: bool,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "message": message.into(),
    }))
}

/// Rejects mutation requests that are not JSON. Browsers cannot send
/// cross-origin JSON with cookies through a plain form post.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if req.method() == Method::POST {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = api_error(
                StatusCode::BAD_REQUEST,
                "Content-Type must be application/json for mutation requests",
            );
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// GET /api/categories
pub async fn categories(catalog: web::Data<dyn CatalogStore>) -> HttpResponse {
    match catalog.list_categories().await {
        Ok(categories) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "categories": categories,
        })),
        Err(e) => {
            log::error!("API category listing failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Categories could not be loaded")
        }
    }
}

/// GET /api/categories/{id}/flow
pub async fn category_flow(
    catalog: web::Data<dyn CatalogStore>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match catalog.find_flow(path.into_inner()).await? {
        Some(flow) => Ok(HttpResponse::Ok().json(flow)),
        None => Ok(api_error(StatusCode::NOT_FOUND, "Flow not found")),
    }
}

/// POST /api/categories/{id}/flow/next: the walker's answer for "continue"
/// from `currentStepId`. `progress` is that of the step moved to.
pub async fn next_step(
    catalog: web::Data<dyn CatalogStore>,
    path: web::Path<i64>,
    body: web::Json<NextRequest>,
) -> Result<HttpResponse, AppError> {
    let Some(flow) = catalog.find_flow(path.into_inner()).await? else {
        return Ok(api_error(StatusCode::NOT_FOUND, "Flow not found"));
    };
    let request = body.into_inner();

    let step = match flow::current_step(&flow, &request.current_step_id) {
        Ok(step) => step,
        Err(e) => return Ok(api_error(StatusCode::NOT_FOUND, e.to_string())),
    };
    let valid = flow::is_step_valid(step, &request.answers, &request.contact);

    match flow::compute_next(&flow, step, &request.answers) {
        Ok(next) => {
            let progress = match &next {
                flow::Next::Step(id) => flow::progress(&flow, id),
                flow::Next::Submit => 100,
            };
            Ok(HttpResponse::Ok().json(NextResponse { next, progress, valid }))
        }
        Err(e @ (FlowError::DeadEnd(_) | FlowError::UnknownStep(_))) => {
            log::warn!("Flow of category {} cannot continue: {e}", flow.category_id);
            Ok(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("/categories", web::get().to(categories))
            .route("/categories/{id}/flow", web::get().to(category_flow))
            .route("/categories/{id}/flow/next", web::post().to(next_step)),
    );
}
