pub mod health_service;
pub mod registration_service;
pub mod schema_service;
