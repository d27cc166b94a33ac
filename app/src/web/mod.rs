// app/src/web/mod.rs

pub mod dashboard;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{middleware::from_fn, web, App};

use crate::state::AppState;

pub use routes::configure_app_routes;

/// The application with its state, session middleware and routes. Shared by
/// the server binary and the integration tests.
pub fn build_app(
  app_state: AppState,
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
    InitError = (),
  >,
> {
  App::new()
    .app_data(web::Data::new(app_state))
    .wrap(from_fn(middleware::session_middleware))
    .wrap(tracing_actix_web::TracingLogger::default())
    .configure(configure_app_routes)
}
