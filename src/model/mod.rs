pub mod administrator;
pub mod attendance;
pub mod employee;
