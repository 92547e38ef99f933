// Application state for HTTP handlers
use crate::application::aggregation_service::AirQualityService;

#[derive(Clone)]
pub struct AppState {
    pub air_quality_service: AirQualityService,
}
