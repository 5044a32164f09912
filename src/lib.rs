//! # Tour Gen
//!
//! Builds the data for a single-page real estate tour from a listing folder.
//! The folder is the data source: `listing.json` describes the property,
//! photo files become the gallery, and subfolders become filter categories.
//!
//! # Architecture: Forward-Only Pipeline
//!
//! A build moves data strictly forward through five components. Each one
//! consumes the previous one's output and never reaches back:
//!
//! ```text
//! 1. Scan        listing/        →  PhotoCatalog          (filesystem → assets)
//! 2. Organize    PhotoCatalog    →  GalleryOrganization   (order, mode, categories)
//! 3. Optimize    assets          →  OptimizedImage map    (parallel JPEG encode)
//! 4. Resolve     gallery + map   →  hero, agent photo
//! 5. Model       everything      →  listing-model.json    (renderer hand-off)
//! ```
//!
//! The renderer, template set, and deployment are outside this crate; they
//! only ever see the serialized [`model::ListingModel`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`listing`] | Loads and validates `listing.json` into a typed [`listing::Listing`] |
//! | [`config`] | Optional `config.toml`: image widths, quality, worker count |
//! | [`scan`] | Walks the listing root, finds photos, hero, agent, and pass-through media |
//! | [`gallery`] | Orders photos and decides merged vs. filtered presentation |
//! | [`hero`] | Hero fallback chain and agent portrait presence |
//! | [`imaging`] | Image backend trait, pure resize math, the `image`-based backend |
//! | [`process`] | Bounded parallel optimization of every image job |
//! | [`cache`] | Content-addressed reuse of previous encodes |
//! | [`model`] | Assembles the renderer-facing [`model::ListingModel`] |
//! | [`pipeline`] | Orchestration: lock, staging directory, atomic publish |
//! | [`lock`] | Exclusive lock file per output directory |
//! | [`types`] | Shared types: [`types::PhotoAsset`], [`types::AssetError`] |
//! | [`naming`] | Folder-name parsing and category labels |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Bad Files Are Warnings, Bad Listings Are Errors
//!
//! A corrupt photo, an unreadable agent portrait, or a missing hero file never
//! stops a build. Each becomes an [`types::AssetError`] and the build carries
//! on with what survives. A malformed `listing.json`, an invalid choice, or a
//! gallery with no usable photos stops the build before anything is written.
//!
//! ## Staging, Then Publish
//!
//! Everything is written into a hidden staging directory next to the output.
//! Only a fully successful build replaces the previous output, so a failure
//! halfway through leaves the old tour intact. A lock file next to the output
//! keeps two builds from interleaving.
//!
//! ## Progressive JPEG Everywhere
//!
//! Main images and thumbnails are always progressive JPEG regardless of the
//! input format. PNG transparency is flattened onto white first. A single
//! output format keeps the renderer free of `<picture>` fallbacks.
//!
//! ## Testable Without Images
//!
//! Every codec call goes through [`imaging::ImageBackend`]. Unit tests use a
//! recording mock, so the ordering, fallback, and failure rules are exercised
//! without decoding a single pixel. Only the integration tests touch real
//! image data.

pub mod cache;
pub mod config;
pub mod gallery;
pub mod hero;
pub mod imaging;
pub mod listing;
pub mod lock;
pub mod model;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
