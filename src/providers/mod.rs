pub mod backend;
pub mod http;

pub use backend::{ApiError, BackendClient};
pub use http::{HttpClient, ReqwestClient};
