use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::schedule::{ScheduleRequest, ValidationResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::schedule::run_schedule,
        super::api::schedule::validate_catalog,
        super::api::schedule::latest_report,
        super::api::schedule::latest_station,
    ),
    components(
        schemas(
            ScheduleRequest,
            ValidationResponse,
            ErrorResponse,
            crate::catalog::PassRecord,
            crate::catalog::PassStatus,
            crate::catalog::RejectedRecord,
            crate::report::ScheduleReport,
            crate::report::SatelliteStats,
            crate::scheduler::StationTimeline,
            crate::scheduler::ScheduledPass,
            crate::scheduler::DroppedPass,
            crate::scheduler::DropReason,
            crate::scheduler::AssumptionViolation,
            crate::scheduler::PassRef,
            crate::scheduler::Window,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Pass-O-Mat Scheduling API",
        description = "Assigns satellite passes to ground stations",
        version = "0.1.0"
    ),
    tags(
        (name = "schedule", description = "Scheduling runs and their results")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert_eq!(
            paths,
            vec![
                "/api/schedule",
                "/api/schedule/latest",
                "/api/schedule/latest/stations/{id}",
                "/api/schedule/validate",
            ]
        );
    }
}
