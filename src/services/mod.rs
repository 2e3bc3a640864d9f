pub mod course_api_service;
pub mod course_parser;
pub mod question_builder;
pub mod session_service;
pub mod upload_service;
pub mod validation_service;
pub mod wizard_service;
