pub mod markowitz;
pub mod universe;
