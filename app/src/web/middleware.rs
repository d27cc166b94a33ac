// app/src/web/middleware.rs

//! Session middleware. Runs before routing on every request: resolves and
//! refreshes the session, applies the route guard, and hands the session to
//! extractors through request extensions.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::middleware::Next;
use actix_web::{error, web, HttpMessage, HttpResponse};
use tracing::{debug, warn};

use crate::state::AppState;
use crate::web::guard::{self, GateDecision};
use crate::web::session;

pub async fn session_middleware(
  req: ServiceRequest,
  next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
  let path = req.path().to_string();
  if guard::is_static(&path) {
    return Ok(next.call(req).await?.map_into_left_body());
  }

  let state = req
    .app_data::<web::Data<AppState>>()
    .cloned()
    .ok_or_else(|| error::ErrorInternalServerError("application state is not configured"))?;

  let resolution = session::resolve(&state.hosted, &state.config, req.request()).await;
  let user_id = resolution.session.as_ref().map(|s| s.user.id);
  let decision = guard::evaluate(&path, user_id, &state.hosted).await;

  let mut res = match decision {
    GateDecision::Allow => {
      if let Some(session) = resolution.session.clone() {
        req.extensions_mut().insert(session);
      }
      next.call(req).await?.map_into_left_body()
    }
    GateDecision::Redirect(location) => {
      debug!(%path, %location, "Request redirected by route guard.");
      let redirect = HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, location))
        .finish();
      req.into_response(redirect).map_into_right_body()
    }
  };

  // Handlers that set or clear the session themselves (sign-in, sign-out)
  // take precedence over what the middleware resolved.
  let access_name = state.config.access_cookie_name();
  let handler_wrote_session = res.response().cookies().any(|c| c.name() == access_name);
  if !handler_wrote_session {
    let cookies = match (&resolution.refreshed, resolution.stale) {
      (Some(refreshed), _) => Some(session::session_cookies(&state.config, refreshed)),
      (None, true) => Some(session::removal_cookies(&state.config)),
      (None, false) => None,
    };
    for cookie in cookies.into_iter().flatten() {
      if let Err(e) = res.response_mut().add_cookie(&cookie) {
        warn!(error = %e, cookie = cookie.name(), "Failed to write session cookie.");
      }
    }
  }

  Ok(res)
}
