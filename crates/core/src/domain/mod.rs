pub mod advisory;
pub mod assumptions;
pub mod projection;
pub mod risk;
