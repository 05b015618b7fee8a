pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod selection;
pub mod watchlist;

pub use routes::create_router;
