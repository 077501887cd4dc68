pub mod conf;
pub mod error;
pub mod ref_id;
