//! # Catalog Harvest
//!
//! Fetches product records from a remote catalog API, normalizes them,
//! writes them to numbered JSON batch files, and later loads those files
//! into a SQLite `products` table.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────┐   ┌────────────┐
//! │ ids.csv  │──▶│ Batch pool   │──▶│ File sink │──▶│ Table sink │
//! │          │   │ Fetch+retry  │   │ products_n│   │  SQLite    │
//! └──────────┘   └──────────────┘   └───────────┘   └────────────┘
//!                   (catalog fetch)                    (catalog load)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog init     # create the products table
//! catalog fetch    # products_id.csv -> output/products_<n>.json
//! catalog load     # output/ -> products table
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with defaults |
//! | [`models`] | Core data types |
//! | [`normalize`] | Raw payload → [`models::ProductRecord`] |
//! | [`fetch`] | HTTP fetcher with two-tier retry |
//! | [`batch`] | Bounded, order-preserving fetch pool |
//! | [`ids`] | Identifier CSV reader |
//! | [`file_sink`] | Numbered batch files |
//! | [`table_sink`] | Per-record transactional load |
//! | [`ingest`] | Fetch-and-save phase |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod batch;
pub mod config;
pub mod db;
pub mod fetch;
pub mod file_sink;
pub mod ids;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod table_sink;
