// Application layer - Use cases and ports
pub mod aggregation_service;
pub mod air_quality_source;
pub mod measurement_fetcher;
pub mod reading_sink;
pub mod schema_unifier;
pub mod sensor_resolver;
pub mod station_locator;

#[cfg(test)]
pub mod test_support;
