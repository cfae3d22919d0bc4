pub mod pricing;
pub mod reports;
pub mod status;
