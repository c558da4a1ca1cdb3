pub mod init_db;
pub mod pages;
pub mod register;
