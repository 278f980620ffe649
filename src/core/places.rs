use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{count_visits_for_place, delete_place, insert_place, load_place, load_places};
use crate::errors::{AppError, AppResult};
use crate::models::place::{PlaceCategory, SavedPlace};

pub struct PlaceLogic;

impl PlaceLogic {
    pub fn add(
        pool: &DbPool,
        user_id: &str,
        name: &str,
        category: PlaceCategory,
        latitude: f64,
        longitude: f64,
        address: &str,
    ) -> AppResult<SavedPlace> {
        if name.trim().is_empty() {
            return Err(AppError::Other("Place name cannot be empty".into()));
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Other(format!(
                "Coordinates out of range: {}, {}",
                latitude, longitude
            )));
        }

        let mut place = SavedPlace::new(user_id, name, category, latitude, longitude, address);
        place.id = insert_place(&pool.conn, &place)?;

        ttlog_quiet(
            &pool.conn,
            "place_add",
            &format!("place #{}", place.id),
            &format!("Saved place '{}' ({})", place.name, category.code()),
        );
        Ok(place)
    }

    pub fn list(pool: &DbPool, user_id: &str) -> AppResult<Vec<SavedPlace>> {
        load_places(&pool.conn, user_id)
    }

    /// Delete a place that no visit references.
    pub fn delete(pool: &DbPool, user_id: &str, id: i64) -> AppResult<SavedPlace> {
        let place = load_place(&pool.conn, user_id, id)?.ok_or(AppError::PlaceNotFound(id))?;

        if count_visits_for_place(&pool.conn, user_id, id)? > 0 {
            return Err(AppError::PlaceInUse(id));
        }

        delete_place(&pool.conn, user_id, id)?;
        ttlog_quiet(
            &pool.conn,
            "place_del",
            &format!("place #{}", id),
            &format!("Deleted place '{}'", place.name),
        );
        Ok(place)
    }
}
