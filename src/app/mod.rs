pub mod intake;
pub mod moderation;
pub mod reviews;
pub mod upload;
