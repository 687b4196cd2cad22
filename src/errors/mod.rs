// Error types shared by the drive services

pub mod drive;

pub use drive::DriveError;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, DriveError>;
