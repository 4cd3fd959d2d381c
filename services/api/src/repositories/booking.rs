//! Booking repository for database operations

use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{Booking, BookingClient, BookingDetails, BookingPhotographer, BookingStatus};

const BOOKING_COLUMNS: &str =
    "b.id, b.client_id, b.photographer_id, b.event_date, b.message, b.status, b.created_at, b.updated_at";

/// Validated booking request
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub photographer_id: Uuid,
    pub event_date: DateTime<Utc>,
    pub message: Option<String>,
}

fn booking_from_row(row: &PgRow) -> DatabaseResult<Booking> {
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        photographer_id: row.try_get("photographer_id")?,
        event_date: row.try_get("event_date")?,
        message: row.try_get("message")?,
        status: status.parse().map_err(DatabaseError::decode)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Booking repository
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending booking for `client_id`
    pub async fn create(&self, client_id: Uuid, new: &NewBooking) -> DatabaseResult<Booking> {
        info!(
            "Creating booking from client {} for photographer {}",
            client_id, new.photographer_id
        );

        let row = sqlx::query(&format!(
            "INSERT INTO bookings AS b (client_id, photographer_id, event_date, message) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(client_id)
        .bind(new.photographer_id)
        .bind(new.event_date)
        .bind(new.message.as_deref())
        .fetch_one(&self.pool)
        .await?;

        booking_from_row(&row)
    }

    /// A booking together with the user that owns the booked profile
    pub async fn find_with_owner(&self, id: Uuid) -> DatabaseResult<Option<(Booking, Uuid)>> {
        let row = sqlx::query(&format!(
            "SELECT {}, p.user_id AS photographer_user_id \
             FROM bookings b JOIN photographers p ON p.id = b.photographer_id \
             WHERE b.id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((
                booking_from_row(&row)?,
                row.try_get("photographer_user_id")?,
            ))),
            None => Ok(None),
        }
    }

    /// Bookings the user made as a client, newest first
    pub async fn list_for_client(&self, client_id: Uuid) -> DatabaseResult<Vec<BookingDetails>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, p.username, u.full_name, u.avatar \
             FROM bookings b \
             JOIN photographers p ON p.id = b.photographer_id \
             JOIN users u ON u.id = p.user_id \
             WHERE b.client_id = $1 \
             ORDER BY b.created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<BookingDetails> {
                let booking = booking_from_row(row)?;
                Ok(BookingDetails {
                    photographer: Some(BookingPhotographer {
                        id: booking.photographer_id,
                        username: row.try_get("username")?,
                        full_name: row.try_get("full_name")?,
                        avatar: row.try_get("avatar")?,
                    }),
                    client: None,
                    booking,
                })
            })
            .collect()
    }

    /// Requests received by a photographer profile, newest first
    pub async fn list_for_photographer(
        &self,
        photographer_id: Uuid,
    ) -> DatabaseResult<Vec<BookingDetails>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, c.full_name, c.email, c.avatar \
             FROM bookings b \
             JOIN users c ON c.id = b.client_id \
             WHERE b.photographer_id = $1 \
             ORDER BY b.created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<BookingDetails> {
                let booking = booking_from_row(row)?;
                Ok(BookingDetails {
                    client: Some(BookingClient {
                        id: booking.client_id,
                        full_name: row.try_get("full_name")?,
                        email: row.try_get("email")?,
                        avatar: row.try_get("avatar")?,
                    }),
                    photographer: None,
                    booking,
                })
            })
            .collect()
    }

    /// Move a booking from `from` to `to`
    ///
    /// Returns `None` when the stored status is no longer `from`.
    pub async fn update_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        info!("Booking {}: {} -> {}", id, from, to);

        let row = sqlx::query(&format!(
            "UPDATE bookings AS b SET status = $3, updated_at = NOW() \
             WHERE b.id = $1 AND b.status = $2 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    /// Whether the client has a completed booking with the photographer
    pub async fn has_completed(&self, client_id: Uuid, photographer_id: Uuid) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings \
             WHERE client_id = $1 AND photographer_id = $2 AND status = 'completed')",
        )
        .bind(client_id)
        .bind(photographer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
