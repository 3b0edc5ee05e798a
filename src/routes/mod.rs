pub mod commentary;
pub mod generate;
pub mod grade;
pub mod health;
pub mod upload;
