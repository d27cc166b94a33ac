// app/src/state.rs

use crate::config::AppConfig;
use crate::hosted::Hosted;
use crate::pipelines::Flows;
use crate::services::cart::CartStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub hosted: Hosted,
  pub config: Arc<AppConfig>,
  pub carts: Arc<CartStore>,
  pub flows: Arc<Flows>,
}

impl AppState {
  pub fn new(hosted: Hosted, config: AppConfig) -> Self {
    Self {
      hosted,
      config: Arc::new(config),
      carts: Arc::new(CartStore::new()),
      flows: Arc::new(Flows::build()),
    }
  }
}
