pub mod annotations;
pub mod books;
pub mod courses;
pub mod messages;
pub mod users;
pub mod videos;
