//! Repositories for database operations

pub mod booking;
pub mod photographer;
pub mod portfolio;
pub mod review;

pub use booking::BookingRepository;
pub use photographer::PhotographerRepository;
pub use portfolio::PortfolioRepository;
pub use review::ReviewRepository;
