//! Request/response surface shared by every step.
//!
//! Socket handling and HTTP wire parsing live outside this crate. The HTTP
//! layer hands over an `http::Request<Vec<u8>>`, which [`Request::from_http`]
//! normalizes, and receives an `http::Response<Vec<u8>>` back from
//! [`Response::into_http`].

mod context;
mod cookie;
mod error;
pub mod request;
pub mod response;

pub use context::Context;
pub use cookie::{CookieOptions, SameSite};
pub use error::ContextError;
pub use request::Request;
pub use response::{HeaderVec, Response, ResponseWriter, MAX_INLINE_HEADERS};
