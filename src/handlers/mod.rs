pub mod exports;
pub mod orders;
pub mod products;
