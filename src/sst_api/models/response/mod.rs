pub mod device;
pub mod house;
