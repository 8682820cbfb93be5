use serde::{Deserialize, Serialize};

use crate::wkt;

/// Role assigned to the authenticated user by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
    Admin,
}

impl Role {
    /// Only drivers and admins are allowed to report positions.
    pub fn can_report(&self) -> bool {
        matches!(self, Role::Driver | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// Authenticated identity of the device user. Created on login, replaced
/// wholesale on refresh, destroyed on logout or fatal auth failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// A fixed transit pickup point. Immutable snapshot per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Seconds until the next vehicle reaches this stop; 0 means unknown.
    #[serde(default)]
    pub eta_seconds: i32,
}

/// Live vehicle near a coordinate. Superseded wholesale on each poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyVehicle {
    pub id: i32,
    pub plate: String,
    pub route_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Route summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: i32,
    pub name: String,
    pub active: bool,
    pub vehicle_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub sequence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteVehicle {
    pub id: i32,
    pub plate: String,
    pub driver: String,
    pub collector: String,
    pub status: String,
}

/// Full route detail as served by `GET /api/v1/routes/{id}`.
///
/// `geometry` is decoded from `shape_polyline` after deserialization and holds
/// (lat, lon) pairs in route order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDetail {
    pub id: i32,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub shape_polyline: String,
    #[serde(skip)]
    pub geometry: Vec<(f64, f64)>,
    #[serde(default)]
    pub stops: Vec<RouteStop>,
    #[serde(default)]
    pub vehicles: Vec<RouteVehicle>,
}

impl RouteDetail {
    /// Decode `shape_polyline` into the `geometry` field. Malformed WKT yields
    /// an empty geometry, never an error.
    pub fn decode_geometry(&mut self) {
        self.geometry = wkt::decode_linestring(&self.shape_polyline);
    }

    pub fn contains_stop(&self, stop_id: i64) -> bool {
        self.stops.iter().any(|s| s.id == stop_id)
    }
}

/// One position report, built fresh each tick and never persisted.
///
/// `heading` is in degrees, `speed` in km/h; both are omitted from the body
/// when the underlying fix did not report them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPositionSample {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Session {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            user: resp.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gating() {
        assert!(!Role::Rider.can_report());
        assert!(Role::Driver.can_report());
        assert!(Role::Admin.can_report());
    }

    #[test]
    fn role_wire_names_are_lowercase() {
        let role: Role = serde_json::from_str("\"driver\"").unwrap();
        assert_eq!(role, Role::Driver);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn position_sample_omits_absent_fields() {
        let sample = DriverPositionSample {
            lat: -7.16,
            lon: -78.5,
            heading: None,
            speed: None,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(!json.contains("heading"));
        assert!(!json.contains("speed"));

        let sample = DriverPositionSample {
            heading: Some(90.0),
            speed: Some(32.4),
            ..sample
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"heading\":90.0"));
        assert!(json.contains("\"speed\":32.4"));
    }

    #[test]
    fn route_detail_decodes_wire_shape() {
        let json = r#"{
            "id": 3,
            "name": "Linea A",
            "active": true,
            "shape_polyline": "LINESTRING(-78.5 -7.16, -78.51 -7.17)",
            "stops": [{"id": 42, "name": "Plaza", "lat": -7.16, "lon": -78.5, "sequence": 1}],
            "vehicles": []
        }"#;
        let mut detail: RouteDetail = serde_json::from_str(json).unwrap();
        detail.decode_geometry();
        assert_eq!(detail.geometry, vec![(-7.16, -78.5), (-7.17, -78.51)]);
        assert!(detail.contains_stop(42));
        assert!(!detail.contains_stop(7));
    }
}
