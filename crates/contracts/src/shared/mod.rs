pub mod sanitize;
pub mod schema;
