pub mod controller;
pub mod crud;
pub mod form;
pub mod model;
pub mod routes;
pub mod schema;

pub use routes::movie_routes;
