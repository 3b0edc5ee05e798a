pub mod json_repair;
pub mod seed;
pub mod text;
pub mod time;
pub mod validation;
