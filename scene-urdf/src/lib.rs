//! Tolerant URDF parser for the scene conversion pipeline.
//!
//! Parses [URDF](http://wiki.ros.org/urdf/XML) robot descriptions into a
//! typed document model ([`UrdfRobot`]) with per-field defaults applied.
//! The model is deliberately close to the markup: axis mapping, asset
//! loading, and cross-reference validation happen downstream in
//! `scene-build`.
//!
//! # Example
//!
//! ```
//! use scene_urdf::parse_urdf_str;
//!
//! let xml = r#"
//!     <robot name="cart">
//!         <link name="base"/>
//!         <link name="wheel"/>
//!         <joint name="axle" type="continuous">
//!             <parent link="base"/>
//!             <child link="wheel"/>
//!             <axis xyz="0 1 0"/>
//!         </joint>
//!     </robot>
//! "#;
//!
//! let robot = parse_urdf_str(xml, "fallback").expect("should parse");
//! assert_eq!(robot.name, "cart");
//! assert_eq!(robot.links.len(), 2);
//! ```

mod error;
mod parser;
mod types;

pub use error::{Result, UrdfError};
pub use parser::parse_urdf_str;
pub use types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfMaterial, UrdfOrigin, UrdfRobot, UrdfVisual,
};

use std::path::Path;

/// Parse a URDF file, deriving the fallback robot name from the file stem.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the document is invalid.
pub fn parse_urdf_file(path: impl AsRef<Path>) -> Result<UrdfRobot> {
    let path = path.as_ref();
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "robot".to_string());
    let xml = std::fs::read_to_string(path)?;
    parse_urdf_str(&xml, &fallback)
}
