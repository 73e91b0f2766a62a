pub mod jwt;
pub mod pricing;
pub mod validation;
