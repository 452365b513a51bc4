use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{NewSquad, Squad};
use crate::schema::squads;

pub const DEFAULT_SQUADS: &[&str] = &[
    "All - Squad",
    "AO - Claim",
    "AO - Digital Care",
    "AO - Fraud",
    "AO - Lifehub",
    "AO - NB",
    "AO - PS",
    "Core - AAS",
    "Core - DCMS",
    "Core - Legacy",
    "Core - PAS",
    "Core - Product Engine",
    "Customer - DPLK",
    "Customer - IFGID",
    "Customer - IFGPay",
    "Customer - Life By IFG",
    "Customer - Lifeforce",
    "Customer - Lifespace",
    "Customer - Marketing",
    "Customer - One By IFG",
    "Customer - Partnership",
    "Data",
    "Finance",
    "IT & Architect - Architect",
    "IT & Architect - Development",
    "IT & Architect - Infra.",
];

pub fn list_squads(conn: &mut SqliteConnection) -> TrackerResult<Vec<Squad>> {
    let rows = squads::table.order(squads::name.asc()).load(conn)?;
    Ok(rows)
}

/// Inserts every name not already present. Returns how many were added.
pub fn seed_squads(conn: &mut SqliteConnection, names: &[&str]) -> TrackerResult<usize> {
    conn.transaction::<usize, TrackerError, _>(|conn| {
        let existing: Vec<String> = squads::table.select(squads::name).load(conn)?;
        let now = Utc::now().naive_utc();
        let mut added = 0;

        for name in names {
            let name = name.trim();
            if name.is_empty() || existing.iter().any(|known| known == name) {
                continue;
            }
            diesel::insert_into(squads::table)
                .values(&NewSquad {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    created_at: now,
                })
                .execute(conn)?;
            added += 1;
        }

        info!(added, total = names.len(), "squads seeded");
        Ok(added)
    })
}
