//! Artifact writers for the published collection.
//!
//! # Submodules
//!
//! - [`json`]: the persisted collection document (`news.json`), written via
//!   an atomic temp-then-rename swap — the one artifact whose failure is
//!   fatal to the run
//! - [`pages`]: one HTML detail document per item under `news/`
//! - [`syndication`]: the site's own RSS document (`feed.xml`)
//! - [`sitemap`]: `sitemap.xml` plus the `robots.txt` crawler policy
//!
//! # Output layout
//!
//! ```text
//! output_dir/
//! ├── news.json
//! ├── news/
//! │   └── <slug>.html
//! ├── feed.xml
//! ├── sitemap.xml
//! └── robots.txt
//! ```

pub mod json;
pub mod pages;
pub mod sitemap;
pub mod syndication;
