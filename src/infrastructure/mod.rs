// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_sink;
pub mod http_response;
pub mod json_mapper;
pub mod openaq_source;
