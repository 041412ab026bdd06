pub use cellular_balloon_building_blocks::*;
pub use cellular_balloon_concepts::*;
