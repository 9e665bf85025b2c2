//! Scene assembly and validation.
//!
//! This crate turns robot data into validated [`Scene`]s ready for wire
//! packaging, from either of two sources:
//!
//! - a robot description document, through [`SceneConverter`], or
//! - a physics engine's introspection tables, through
//!   [`scene_from_records`] and [`shapes_from_records`].
//!
//! Both paths end in the same [`validate`] pass; a scene that comes out of
//! this crate satisfies every data-model invariant the packager and the
//! renderer rely on. Assembly is all-or-nothing: the first error aborts
//! the conversion and nothing is produced for that input.
//!
//! [`Scene`]: scene_types::Scene

mod assemble;
mod error;
mod introspect;
mod validate;

pub use assemble::SceneConverter;
pub use error::{BuildError, BuildResult};
pub use introspect::{
    joint_kind_from_code, link_name, scene_from_records, shape_kind_from_code,
    shapes_from_records, JointRecord, VisualShapeRecord,
};
pub use validate::{validate, ValidationError};
