pub mod answer;
pub mod exam;
pub mod grade_result;
pub mod question;
