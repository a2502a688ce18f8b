pub mod tenant;

pub use tenant::ActiveTenant;
