pub mod controller;
pub mod debounce;
pub mod fetch;
pub mod mutation;
pub mod normalize;

pub use controller::*;
pub use debounce::*;
pub use fetch::*;
pub use mutation::*;
pub use normalize::*;
