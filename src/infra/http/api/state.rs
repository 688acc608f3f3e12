use std::sync::Arc;

use crate::application::auth::TokenService;
use crate::application::carts::CartService;
use crate::application::listing::ListService;
use crate::application::monitor::HealthMonitor;
use crate::application::orders::OrderService;
use crate::application::reviews::ReviewService;

#[derive(Clone)]
pub struct ApiState {
    pub lists: Arc<ListService>,
    pub tokens: Arc<TokenService>,
    pub reviews: Arc<ReviewService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub monitor: Arc<HealthMonitor>,
}
