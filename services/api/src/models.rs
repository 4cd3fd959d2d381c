//! API models for request and response payloads

pub mod booking;
pub mod photographer;
pub mod portfolio;
pub mod review;

pub use booking::{
    Booking, BookingActor, BookingClient, BookingDetails, BookingPhotographer, BookingStatus,
    CreateBookingRequest, UpdateBookingStatusRequest,
};
pub use photographer::{
    BrowseQuery, BrowseResponse, CreatePhotographerRequest, OwnerSummary, Photographer,
    PhotographerFilter, PhotographerProfile, PhotographerUpdate, UpdatePhotographerRequest,
};
pub use portfolio::{CreatePortfolioItemRequest, MediaType, PortfolioItem};
pub use review::{CreateReviewRequest, Review, ReviewAuthor, ReviewListResponse, ReviewWithAuthor};
