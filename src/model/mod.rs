pub mod common;
pub mod envelope;
pub mod mutation;
pub mod query;
pub mod records;
pub mod rows;
pub mod session;

pub use common::*;
pub use envelope::*;
pub use mutation::*;
pub use query::*;
pub use records::*;
pub use rows::*;
pub use session::*;
