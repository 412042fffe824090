pub mod dispatcher;
pub mod subscription;
pub mod ws;
