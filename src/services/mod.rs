pub mod file_service;
pub mod mime;
pub mod quota;
