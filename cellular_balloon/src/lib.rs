#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! [cellular_balloon](crate) segments cells in microscopy images by inflating deformable
//! contours ("balloons") until they lock onto the cell walls.
//! Each balloon is a closed chain of point masses connected by springs.
//! It grows under a pressure which is active wherever the image is darker than a target level
//! and is afterwards aligned to the image edges like a classic snake.
//!
//! The workspace is split into
//! - [concepts] with the traits through which a contour samples its image and the error types,
//! - [building_blocks] with the contour engine itself.

pub use cellular_balloon_building_blocks as building_blocks;

pub use cellular_balloon_concepts as concepts;

/// Re-exports the contour engine and its traits.
pub mod prelude;
