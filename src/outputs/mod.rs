//! Output generation for the archive of one domain.
//!
//! # Submodules
//!
//! - [`json`]: Pretty JSON writer, the persisted dedup index and `summary.json`
//! - [`markdown`]: Per-entry `article.md` and `README.txt`
//! - [`csv`]: The `articles.csv` spreadsheet
//! - [`indexes`]: The chronological `ARCHIVE_INDEX.md`
//!
//! # Output Structure
//!
//! ```text
//! {archive_root}/{domain}/
//! ├── index.json
//! ├── articles.json
//! ├── articles.csv
//! ├── summary.json
//! ├── ARCHIVE_INDEX.md
//! └── articles/2024/january/15/{slug}-{disambiguator}/
//!     ├── article.json
//!     ├── article.html
//!     ├── article.md
//!     ├── README.txt
//!     ├── screenshot.png
//!     └── media/
//! ```

pub mod csv;
pub mod indexes;
pub mod json;
pub mod markdown;
