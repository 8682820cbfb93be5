//! HTTP client for the Qapac backend.
//!
//! Stateless beyond the shared transport; every method maps one REST endpoint
//! and may be invoked concurrently for independent queries. Error policy is
//! the caller's business: read paths absorb failures locally, only the
//! position report escalates auth failures into a session change.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::models::{
    DriverPositionSample, LoginRequest, LoginResponse, NearbyVehicle, Route, RouteDetail, Stop,
};
use crate::providers::http::HttpClient;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure, no response was received.
    #[error("network error: {0}")]
    Network(String),
    /// 401 or 403 - the session is no longer valid.
    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },
    /// Any other non-2xx response.
    #[error("server returned HTTP {status}")]
    Server { status: u16 },
    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    Decode(String),
    /// The request could not be built (bad URL, header value, or body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}

pub struct BackendClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("base url {}: {}", base_url, e)))?;

        Ok(Self { http, base_url })
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("api/v1/auth/login")?;
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        debug!(username, "Logging in");
        let req = json_request(Method::POST, url, &body)?;
        let resp = self.http.execute(req).await?;
        read_json(resp).await
    }

    /// Stops near a coordinate, with their next-vehicle ETA.
    pub async fn nearby_stops(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<Stop>, ApiError> {
        let mut url = self.url("api/v1/stops/nearby")?;
        append_nearby_query(&mut url, lat, lon, radius_meters);

        let resp = self.http.execute(Request::new(Method::GET, url)).await?;
        read_json(resp).await
    }

    /// Live vehicles near a coordinate. Best-effort layer; callers retry on
    /// the next poll tick rather than surfacing failures.
    pub async fn nearby_vehicles(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<NearbyVehicle>, ApiError> {
        let mut url = self.url("api/v1/vehicles/nearby")?;
        append_nearby_query(&mut url, lat, lon, radius_meters);

        let resp = self.http.execute(Request::new(Method::GET, url)).await?;
        read_json(resp).await
    }

    /// Single stop with its current ETA.
    pub async fn stop_detail(&self, stop_id: i64) -> Result<Stop, ApiError> {
        let url = self.url(&format!("api/v1/stops/{}", stop_id))?;
        let resp = self.http.execute(Request::new(Method::GET, url)).await?;
        read_json(resp).await
    }

    /// All route summary rows.
    pub async fn routes(&self) -> Result<Vec<Route>, ApiError> {
        let url = self.url("api/v1/routes")?;
        let resp = self.http.execute(Request::new(Method::GET, url)).await?;
        read_json(resp).await
    }

    /// Full route detail with geometry already decoded from WKT.
    pub async fn route_detail(&self, route_id: i32) -> Result<RouteDetail, ApiError> {
        let url = self.url(&format!("api/v1/routes/{}", route_id))?;
        let resp = self.http.execute(Request::new(Method::GET, url)).await?;

        let mut detail: RouteDetail = read_json(resp).await?;
        detail.decode_geometry();
        Ok(detail)
    }

    /// Report the driver's current position under the given bearer token.
    pub async fn report_position(
        &self,
        access_token: &str,
        sample: &DriverPositionSample,
    ) -> Result<(), ApiError> {
        let url = self.url("api/v1/driver/position")?;

        let mut req = json_request(Method::POST, url, sample)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| ApiError::InvalidRequest(format!("bearer token: {}", e)))?;
        req.headers_mut().insert(AUTHORIZATION, bearer);

        let resp = self.http.execute(req).await?;
        check_status(resp.status())
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("url path {}: {}", path, e)))
    }
}

fn append_nearby_query(url: &mut Url, lat: f64, lon: f64, radius_meters: f64) {
    url.query_pairs_mut()
        .append_pair("lat", &lat.to_string())
        .append_pair("lon", &lon.to_string())
        .append_pair("radius", &radius_meters.to_string());
}

fn json_request<B: Serialize>(method: Method, url: Url, body: &B) -> Result<Request, ApiError> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| ApiError::InvalidRequest(format!("encode body: {}", e)))?;

    let mut req = Request::new(method, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(bytes.into());
    Ok(req)
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(ApiError::Auth {
            status: status.as_u16(),
        })
    } else {
        Err(ApiError::Server {
            status: status.as_u16(),
        })
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    check_status(resp.status())?;
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTransport;

    #[async_trait::async_trait]
    impl HttpClient for NoTransport {
        async fn execute(&self, _req: Request) -> Result<reqwest::Response, ApiError> {
            Err(ApiError::Network("no transport in this test".to_string()))
        }
    }

    #[test]
    fn malformed_base_url_is_a_construction_error_not_a_network_one() {
        let err = BackendClient::new("::not a url::", Arc::new(NoTransport)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(err.to_string().starts_with("invalid request"));
    }

    #[test]
    fn auth_statuses_are_fatal_for_the_session() {
        assert!(check_status(StatusCode::UNAUTHORIZED).unwrap_err().is_auth());
        assert!(check_status(StatusCode::FORBIDDEN).unwrap_err().is_auth());
    }

    #[test]
    fn other_failures_are_plain_server_errors() {
        match check_status(StatusCode::INTERNAL_SERVER_ERROR) {
            Err(ApiError::Server { status: 500 }) => {}
            other => panic!("unexpected: {:?}", other.err()),
        }
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn nearby_query_carries_all_three_params() {
        let mut url = Url::parse("https://api.qapac.test/api/v1/stops/nearby").unwrap();
        append_nearby_query(&mut url, -7.16, -78.5, 500.0);
        let query = url.query().unwrap();
        assert!(query.contains("lat=-7.16"));
        assert!(query.contains("lon=-78.5"));
        assert!(query.contains("radius=500"));
    }
}
