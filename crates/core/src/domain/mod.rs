pub mod asin;
pub mod product;
