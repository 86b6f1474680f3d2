//! Bearer-token check for the upload routes

use crate::config::ServerConfig;
use crate::ingestion::IngestionError;
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

/// Accept the request when no token is configured or the bearer token matches.
pub fn authorize(req: &HttpRequest, config: &ServerConfig) -> Result<(), IngestionError> {
    if !config.requires_token() {
        return Ok(());
    }
    let expected = config.api_token.as_deref().unwrap_or_default();

    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(IngestionError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn config_with_token(token: Option<&str>) -> ServerConfig {
        ServerConfig {
            api_token: token.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn open_when_no_token_configured() {
        let req = TestRequest::default().to_http_request();
        assert!(authorize(&req, &config_with_token(None)).is_ok());
    }

    #[test]
    fn empty_token_leaves_routes_open() {
        let req = TestRequest::default().to_http_request();
        assert!(authorize(&req, &config_with_token(Some(""))).is_ok());
    }

    #[test]
    fn checks_bearer_token() {
        let config = config_with_token(Some("secret"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer secret"))
            .to_http_request();
        assert!(authorize(&req, &config).is_ok());

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer wrong"))
            .to_http_request();
        assert!(matches!(
            authorize(&req, &config),
            Err(IngestionError::Unauthorized)
        ));

        let req = TestRequest::default().to_http_request();
        assert!(authorize(&req, &config).is_err());
    }
}
