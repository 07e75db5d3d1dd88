pub mod cookies;
pub mod request;
pub mod response;
pub mod server;

pub use cookies::{CookieJar, CookieOptions, SealedCookies};
pub use request::Request;
pub use response::Response;
pub use server::Server;
