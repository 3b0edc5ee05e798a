pub mod commentary_dto;
pub mod exam_dto;
