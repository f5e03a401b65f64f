pub mod mood;
pub mod session;
pub mod theme;
