pub mod http;
pub mod media;
pub mod providers;
pub mod redis;
