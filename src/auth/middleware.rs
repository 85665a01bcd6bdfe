use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use super::session::current_user;

/// Guards the admin scope: anonymous visitors go to /login, signed-in
/// non-admins get 403.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let user = current_user(&req.get_session());

    let response = match user {
        Some(u) if u.is_admin() => {
            return next.call(req).await.map(|res| res.map_into_left_body());
        }
        Some(u) => {
            log::warn!("User {} denied access to {}", u.id, req.path());
            HttpResponse::Forbidden().body("Forbidden")
        }
        None => HttpResponse::SeeOther()
            .insert_header(("Location", "/login"))
            .finish(),
    };
    Ok(req.into_response(response).map_into_right_body())
}
