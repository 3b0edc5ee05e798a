pub mod ai_service;
pub mod commentary_service;
pub mod extraction_service;
pub mod generation_service;
pub mod grading_service;
