pub mod credentials;
pub mod hooks;
pub mod status;
