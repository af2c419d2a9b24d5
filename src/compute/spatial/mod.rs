pub mod algorithms;
pub use algorithms::{
    bounding_box, disk_intersects_polygon, disk_outline, distance_between,
    distance_to_polygon, earth_radius, point_to_local_meters,
};

pub mod rtree;
pub use rtree::{FeatureIndex, Footprint, IndexStats};
