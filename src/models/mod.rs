pub mod course;
pub mod difficulty;
pub mod question;
pub mod validation;
pub mod video;
pub mod wizard;
