pub mod auth;
pub mod backend;
pub mod http;
pub mod notify;
pub mod resources;

pub use auth::*;
pub use backend::*;
pub use http::*;
pub use notify::*;
pub use resources::*;
