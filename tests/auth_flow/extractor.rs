use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web, App, FromRequest, HttpResponse, Responder};

use auth0_guard::{AuthError, AuthenticatedUser, JwksResolver, PrincipalMapper};

use super::*;

#[actix_rt::test]
async fn rejects_missing_or_non_bearer_authorization() {
    let requests = vec![
        actix_test::TestRequest::default().to_http_request(),
        actix_test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request(),
        actix_test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_http_request(),
    ];

    for request in requests {
        let result = AuthenticatedUser::from_request(&request, &mut Payload::None).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }
}

#[actix_rt::test]
async fn missing_app_data_is_an_internal_error() {
    let request = actix_test::TestRequest::default()
        .insert_header((AUTHORIZATION, "Bearer some-token"))
        .to_http_request();

    let result = AuthenticatedUser::from_request(&request, &mut Payload::None).await;
    assert!(matches!(result, Err(AuthError::Internal(_))));
}

#[actix_rt::test]
async fn valid_token_resolves_default_principal() {
    let resolver: Arc<dyn JwksResolver> = Arc::new(StaticResolver::new());
    let request = actix_test::TestRequest::default()
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", jwt::valid_token("auth0|62ea0b2e8a")),
        ))
        .app_data(web::Data::new(resolver))
        .app_data(web::Data::new(test_auth0_config()))
        .to_http_request();

    let user = AuthenticatedUser::from_request(&request, &mut Payload::None)
        .await
        .expect("extraction should succeed");

    assert_eq!(user.0.username, "auth0.62ea0b2e8a");
    assert_eq!(user.0.subject, "auth0|62ea0b2e8a");
    assert_eq!(user.0.claims.email.as_deref(), Some("user@example.test"));
}

#[actix_rt::test]
async fn registered_mapper_overrides_default_principal() {
    let resolver: Arc<dyn JwksResolver> = Arc::new(StaticResolver::new());
    let mapper: Arc<dyn PrincipalMapper> = Arc::new(RenamingMapper);
    let request = actix_test::TestRequest::default()
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", jwt::valid_token("auth0|mapped")),
        ))
        .app_data(web::Data::new(resolver))
        .app_data(web::Data::new(mapper))
        .app_data(web::Data::new(test_auth0_config()))
        .to_http_request();

    let user = AuthenticatedUser::from_request(&request, &mut Payload::None)
        .await
        .expect("extraction should succeed");

    assert_eq!(user.0.username, "local:auth0|mapped");
}

#[actix_rt::test]
async fn mapper_failure_propagates() {
    let resolver: Arc<dyn JwksResolver> = Arc::new(StaticResolver::new());
    let mapper: Arc<dyn PrincipalMapper> = Arc::new(RejectingMapper);
    let request = actix_test::TestRequest::default()
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", jwt::valid_token("auth0|rejected")),
        ))
        .app_data(web::Data::new(resolver))
        .app_data(web::Data::new(mapper))
        .app_data(web::Data::new(test_auth0_config()))
        .to_http_request();

    let result = AuthenticatedUser::from_request(&request, &mut Payload::None).await;
    assert!(matches!(result, Err(AuthError::Unauthorized)));
}

async fn whoami(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().body(user.0.username)
}

#[actix_rt::test]
async fn guarded_route_accepts_valid_token() {
    let resolver: Arc<dyn JwksResolver> = Arc::new(StaticResolver::new());
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(resolver))
            .app_data(web::Data::new(test_auth0_config()))
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let request = actix_test::TestRequest::get()
        .uri("/whoami")
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", jwt::valid_token("auth0|e2e")),
        ))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = actix_test::read_body(response).await;
    assert_eq!(body.as_ref(), b"auth0.e2e");
}

#[actix_rt::test]
async fn guarded_route_reports_failures_with_distinct_codes() {
    let resolver: Arc<dyn JwksResolver> = Arc::new(StaticResolver::new());
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(resolver))
            .app_data(web::Data::new(test_auth0_config()))
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let cases = vec![
        (None, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        (
            Some(jwt::expired_token("auth0|e2e")),
            StatusCode::UNAUTHORIZED,
            "TOKEN_EXPIRED",
        ),
        (
            Some(jwt::tamper_signature(&jwt::valid_token("auth0|e2e"))),
            StatusCode::UNAUTHORIZED,
            "INVALID_SIGNATURE",
        ),
        (
            Some(jwt::wrong_audience_token("auth0|e2e")),
            StatusCode::UNAUTHORIZED,
            "WRONG_AUDIENCE",
        ),
        (
            Some("not-a-jwt".to_string()),
            StatusCode::UNAUTHORIZED,
            "MALFORMED_TOKEN",
        ),
    ];

    for (token, expected_status, expected_code) in cases {
        let mut builder = actix_test::TestRequest::get().uri("/whoami");
        if let Some(token) = token {
            builder = builder.insert_header((AUTHORIZATION, format!("Bearer {token}")));
        }
        let response = actix_test::call_service(&app, builder.to_request()).await;

        assert_eq!(response.status(), expected_status);
        let body: serde_json::Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], expected_code);
        assert!(body["error"].is_string());
        assert!(body["message"].is_string());
    }
}
