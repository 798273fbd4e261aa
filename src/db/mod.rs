pub mod annotations;
pub mod books;
pub mod courses;
pub mod messages;
pub mod password_resets;
pub mod users;
pub mod videos;
