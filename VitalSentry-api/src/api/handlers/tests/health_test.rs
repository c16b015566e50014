#[cfg(test)]
mod health_tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::Extension;

    use vital_sentry_domain::health::HealthServiceTrait;
    use vital_sentry_domain::testing::MockHealthService;

    use crate::api::handlers::health::{health_check, initialize_server_start_time};

    #[tokio::test]
    async fn test_health_check_healthy() {
        initialize_server_start_time();

        let health_service =
            Arc::new(MockHealthService::new()) as Arc<dyn HealthServiceTrait + Send + Sync>;

        let response = health_check(Extension(health_service))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check_unhealthy_database() {
        initialize_server_start_time();

        let health_service = Arc::new(MockHealthService::new().with_unhealthy_database())
            as Arc<dyn HealthServiceTrait + Send + Sync>;

        let response = health_check(Extension(health_service))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
