pub mod config_route;
pub mod health_route;
pub mod root_route;
