pub mod aggregate;
pub mod dates;
pub mod export;
pub mod goals;
pub mod models;
pub mod openfoodfacts;
pub mod persist;
pub mod service;
pub mod store;
pub mod sync;
