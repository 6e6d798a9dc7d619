//! Car repository backed by the SQLite `cars` table.
//!
//! # Responsibility
//! - Provide the record store contract over `cars`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save` validates before any SQL runs.
//! - `save` of a new car writes the engine-generated id back into the caller's
//!   entity; `save` of a car whose id is not stored changes nothing.
//! - `list` issues no `ORDER BY`; callers must not rely on row order.

use crate::model::car::{Car, CarPatch};
use crate::model::validation::Validate;
use crate::model::RecordId;
use crate::repo::{RecordStore, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CAR_SELECT_SQL: &str = "SELECT id, make, model FROM cars";

/// SQLite-backed car repository.
pub struct SqliteCarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCarRepository<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert(&self, car: &mut Car) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO cars (make, model) VALUES (?1, ?2);",
            params![car.make.as_str(), car.model.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        car.id = Some(id);
        debug!("event=car_insert module=repo status=ok id={id}");
        Ok(())
    }

    fn overwrite(&self, id: RecordId, car: &Car) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE cars SET make = ?1, model = ?2 WHERE id = ?3;",
            params![car.make.as_str(), car.model.as_str(), id],
        )?;
        debug!("event=car_update module=repo status=ok id={id} changed={changed}");
        Ok(())
    }
}

impl RecordStore for SqliteCarRepository<'_> {
    type Record = Car;
    type Patch = CarPatch;

    fn list(&self) -> RepoResult<Vec<Car>> {
        let mut stmt = self.conn.prepare(&format!("{CAR_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut cars = Vec::new();

        while let Some(row) = rows.next()? {
            cars.push(parse_car_row(row)?);
        }

        Ok(cars)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Car>> {
        let car = self
            .conn
            .query_row(
                &format!("{CAR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_car_row,
            )
            .optional()?;
        Ok(car)
    }

    fn save(&self, car: &mut Car) -> RepoResult<()> {
        car.validate().into_result()?;

        match car.id {
            Some(id) => self.overwrite(id, car),
            None => self.insert(car),
        }
    }

    fn update(&self, id: RecordId, patch: &CarPatch) -> RepoResult<Option<Car>> {
        patch.validate().into_result()?;

        let changed = self.conn.execute(
            "UPDATE cars
             SET
                make = COALESCE(?1, make),
                model = COALESCE(?2, model)
             WHERE id = ?3;",
            params![patch.make.as_deref(), patch.model.as_deref(), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        self.get(id)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM cars WHERE id = ?1;", [id])?;
        debug!("event=car_delete module=repo status=ok id={id} changed={changed}");
        Ok(changed > 0)
    }
}

fn parse_car_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: Some(row.get("id")?),
        make: row.get::<_, Option<String>>("make")?.unwrap_or_default(),
        model: row.get::<_, Option<String>>("model")?.unwrap_or_default(),
    })
}
