// Repositories
pub mod swap;
