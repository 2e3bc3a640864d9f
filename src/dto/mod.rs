pub mod course_dto;
pub mod wizard_dto;
