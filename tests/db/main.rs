mod books;
mod courses;
mod helpers;
