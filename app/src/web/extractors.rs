// app/src/web/extractors.rs

use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::hosted::AuthUser;
use crate::web::session::Session;

/// The caller's validated session, as placed in request extensions by the
/// session middleware. Rejects with 401 when there is none.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Session);

impl AuthenticatedUser {
  pub fn id(&self) -> Uuid {
    self.0.user.id
  }

  pub fn user(&self) -> &AuthUser {
    &self.0.user
  }

  pub fn access_token(&self) -> &str {
    &self.0.access_token
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    match req.extensions().get::<Session>() {
      Some(session) => ready(Ok(AuthenticatedUser(session.clone()))),
      None => {
        debug!(path = req.path(), "No session on request.");
        ready(Err(AppError::Auth("Sign in to continue.".to_string())))
      }
    }
  }
}

/// The session if there is one; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(Ok(MaybeUser(req.extensions().get::<Session>().cloned())))
  }
}
