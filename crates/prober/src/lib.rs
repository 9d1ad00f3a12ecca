//! Probers - concrete login attempt implementations
//!
//! - `HttpLoginProber`: submits a login form over HTTP and reads the session cookie
//! - `SimulatedProber`: random latency and faults, for demos and load shaping
//! - `FnProber`: wraps a blocking probe function

mod blocking;
mod http_login;
mod page;
mod simulated;

pub use blocking::FnProber;
pub use http_login::{
    HttpLoginProber, DEFAULT_LOGIN_URL, DEFAULT_PASSWORD, DEFAULT_USERNAME, SESSION_COOKIE,
};
pub use page::{extract_flash, find_cookie, FlashKind};
pub use simulated::SimulatedProber;
