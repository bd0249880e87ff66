/// Car Catalog and Rental Routes
///
/// Public catalog reads with query-time rental-state derivation, admin-only
/// catalog writes, and the customer booking operation.
///
/// A rental is *active* at instant `t` when `rent_started_at <= t` and
/// `rent_ended_at` is null or after `t` (half-open window, UTC). A car with
/// an active rental cannot be booked again.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::{ApiError, ValidationError};
use crate::models::{CarRecord, RentalRecord};

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCarsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub size: Option<String>,
    /// Instant the rental-state derivation is evaluated at; defaults to now.
    pub available_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CarRequest {
    pub name: String,
    pub price: i64,
    pub size: String,
    pub image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRequest {
    pub rent_started_at: DateTime<Utc>,
    pub rent_ended_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_count: i64,
    pub page_size: i64,
    pub count: i64,
}

#[derive(Serialize)]
pub struct ListCarsResponse {
    pub cars: Vec<CarRecord>,
    pub meta: ListMeta,
}

#[derive(Serialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

pub fn build_pagination(page: i64, page_size: i64, count: i64) -> Pagination {
    let page_count = if count == 0 {
        0
    } else {
        (count + page_size - 1) / page_size
    };
    Pagination {
        page,
        page_count,
        page_size,
        count,
    }
}

/// Resolve the booking window: the end defaults to one day after the start,
/// and must come after it.
fn rental_window(
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let ended_at = match ended_at {
        Some(ended_at) => ended_at,
        // Out-of-range starts (chrono caps out near year 262143) cannot
        // produce a valid default end.
        None => started_at
            .checked_add_signed(Duration::days(1))
            .ok_or(ApiError::Validation(ValidationError::InvalidFormat(
                "rentEndedAt",
            )))?,
    };
    if ended_at <= started_at {
        return Err(ApiError::Validation(ValidationError::InvalidFormat(
            "rentEndedAt",
        )));
    }
    Ok((started_at, ended_at))
}

type CarRow = (i64, String, i64, String, Option<String>, bool);

fn car_from_row(row: CarRow) -> CarRecord {
    CarRecord {
        id: row.0,
        name: row.1,
        price: row.2,
        size: row.3,
        image: row.4,
        is_currently_rented: row.5,
    }
}

/// Point lookup with the rental state derived as of `at`.
async fn find_car(pool: &PgPool, id: i64, at: DateTime<Utc>) -> Result<Option<CarRecord>, ApiError> {
    let row = sqlx::query_as::<_, CarRow>(
        r#"
        SELECT c.id, c.name, c.price, c.size, c.image,
               EXISTS (
                   SELECT 1 FROM rentals rt
                   WHERE rt.car_id = c.id
                     AND rt.rent_started_at <= $2
                     AND (rt.rent_ended_at IS NULL OR rt.rent_ended_at > $2)
               ) AS is_currently_rented
        FROM cars c
        WHERE c.id = $1
        "#,
    )
    .bind(id)
    .bind(at)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(car_from_row))
}

/// GET /v1/cars
///
/// Paginated catalog listing. `size` filters exactly; `availableAt` moves
/// the instant the derived rental state is evaluated at.
pub async fn list_cars(
    query: web::Query<ListCarsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    // The offset is query-controlled; an absurd page must not overflow into
    // a negative OFFSET.
    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or(ApiError::Validation(ValidationError::InvalidFormat("page")))?;
    let at = query.available_at.unwrap_or_else(Utc::now);

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM cars WHERE ($1::text IS NULL OR size = $1)",
    )
    .bind(&query.size)
    .fetch_one(pool.get_ref())
    .await?;

    let rows = sqlx::query_as::<_, CarRow>(
        r#"
        SELECT c.id, c.name, c.price, c.size, c.image,
               EXISTS (
                   SELECT 1 FROM rentals rt
                   WHERE rt.car_id = c.id
                     AND rt.rent_started_at <= $2
                     AND (rt.rent_ended_at IS NULL OR rt.rent_ended_at > $2)
               ) AS is_currently_rented
        FROM cars c
        WHERE ($1::text IS NULL OR c.size = $1)
        ORDER BY c.id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.size)
    .bind(at)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(ListCarsResponse {
        cars: rows.into_iter().map(car_from_row).collect(),
        meta: ListMeta {
            pagination: build_pagination(page, page_size, count),
        },
    }))
}

/// GET /v1/cars/{id}
pub async fn get_car(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let car = find_car(pool.get_ref(), path.into_inner(), Utc::now())
        .await?
        .ok_or_else(|| ApiError::RecordNotFound {
            name: "Car".to_string(),
        })?;

    Ok(HttpResponse::Ok().json(car))
}

/// POST /v1/cars — ADMIN only.
pub async fn create_car(
    form: web::Json<CarRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO cars (name, price, size, image, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id
        "#,
    )
    .bind(&form.name)
    .bind(form.price)
    .bind(&form.size)
    .bind(&form.image)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(car_id = id, "Car created");

    Ok(HttpResponse::Created().json(CarRecord {
        id,
        name: form.name.clone(),
        price: form.price,
        size: form.size.clone(),
        image: form.image.clone(),
        is_currently_rented: false,
    }))
}

/// PUT /v1/cars/{id} — ADMIN only.
pub async fn update_car(
    path: web::Path<i64>,
    form: web::Json<CarRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let car = find_car(pool.get_ref(), id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::RecordNotFound {
            name: "Car".to_string(),
        })?;

    sqlx::query(
        r#"
        UPDATE cars
        SET name = $1, price = $2, size = $3, image = $4, updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(&form.name)
    .bind(form.price)
    .bind(&form.size)
    .bind(&form.image)
    .bind(Utc::now())
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(CarRecord {
        id,
        name: form.name.clone(),
        price: form.price,
        size: form.size.clone(),
        image: form.image.clone(),
        is_currently_rented: car.is_currently_rented,
    }))
}

/// DELETE /v1/cars/{id} — ADMIN only.
pub async fn delete_car(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    find_car(pool.get_ref(), id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::RecordNotFound {
            name: "Car".to_string(),
        })?;

    sqlx::query("DELETE FROM rentals WHERE car_id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;
    sqlx::query("DELETE FROM cars WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    tracing::info!(car_id = id, "Car deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /v1/cars/{id}/rent — CUSTOMER only.
///
/// Books the car for the authenticated user. A car with an active rental
/// cannot be booked again; the conditional INSERT makes the check and the
/// create a single atomic statement, so two concurrent bookings for the same
/// car cannot both succeed.
///
/// # Errors
/// - 404: car not found
/// - 422: car already rented
pub async fn rent_car(
    path: web::Path<i64>,
    form: web::Json<RentRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let car_id = path.into_inner();
    let now = Utc::now();

    let car = find_car(pool.get_ref(), car_id, now)
        .await?
        .ok_or_else(|| ApiError::RecordNotFound {
            name: "Car".to_string(),
        })?;

    if car.is_currently_rented {
        return Err(ApiError::CarAlreadyRented { car });
    }

    let (started_at, ended_at) = rental_window(form.rent_started_at, form.rent_ended_at)?;

    // The WHERE NOT EXISTS re-checks the exclusivity invariant inside the
    // INSERT itself; a concurrent booking that won the race leaves nothing
    // to insert here.
    let rental = sqlx::query_as::<_, (i64, i64, i64, DateTime<Utc>, Option<DateTime<Utc>>)>(
        r#"
        INSERT INTO rentals (user_id, car_id, rent_started_at, rent_ended_at, created_at)
        SELECT $1, $2, $3, $4, $5
        WHERE NOT EXISTS (
            SELECT 1 FROM rentals
            WHERE car_id = $2
              AND rent_started_at <= $5
              AND (rent_ended_at IS NULL OR rent_ended_at > $5)
        )
        RETURNING id, user_id, car_id, rent_started_at, rent_ended_at
        "#,
    )
    .bind(claims.id)
    .bind(car_id)
    .bind(started_at)
    .bind(ended_at)
    .bind(now)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::CarAlreadyRented { car })?;

    tracing::info!(
        user_id = claims.id,
        car_id = car_id,
        "Car rented"
    );

    Ok(HttpResponse::Created().json(RentalRecord {
        id: rental.0,
        user_id: rental.1,
        car_id: rental.2,
        rent_started_at: rental.3,
        rent_ended_at: rental.4,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounds_page_count_up() {
        let pagination = build_pagination(1, 10, 31);
        assert_eq!(pagination.page_count, 4);
        assert_eq!(pagination.count, 31);
    }

    #[test]
    fn test_pagination_exact_fit() {
        assert_eq!(build_pagination(2, 10, 30).page_count, 3);
    }

    #[test]
    fn test_pagination_empty_catalog() {
        assert_eq!(build_pagination(1, 10, 0).page_count, 0);
    }

    #[test]
    fn test_rental_window_defaults_to_one_day() {
        let start = Utc::now();
        let (started_at, ended_at) = rental_window(start, None).unwrap();

        assert_eq!(started_at, start);
        assert_eq!(ended_at, start + Duration::days(1));
    }

    #[test]
    fn test_rental_window_keeps_explicit_end() {
        let start = Utc::now();
        let end = start + Duration::days(3);
        let (_, ended_at) = rental_window(start, Some(end)).unwrap();

        assert_eq!(ended_at, end);
    }

    #[test]
    fn test_rental_window_rejects_unrepresentable_default_end() {
        // A start at the far edge of the representable range leaves no room
        // for the one-day default.
        assert!(rental_window(DateTime::<Utc>::MAX_UTC, None).is_err());
    }

    #[test]
    fn test_rental_window_rejects_inverted_bounds() {
        let start = Utc::now();
        assert!(rental_window(start, Some(start)).is_err());
        assert!(rental_window(start, Some(start - Duration::hours(1))).is_err());
    }
}
