pub mod conversion;
pub mod v1;
