pub mod archive;
pub mod attachments;
pub mod backup;
pub mod changelog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod side_quests;
pub mod sla;
pub mod squads;
pub mod state;
pub mod status;
pub mod submissions;
pub mod utils;
