//! texbake Job Model
//!
//! Defines the data contracts of a render job:
//! - **Request:** the caller's model path and ordered texture paths
//! - **Metadata:** model name and date token derived from untrusted path strings
//! - **Naming:** the `<model>_<date>_<YYYYMMDD_HHMMSS>.<ext>` artifact convention
//! - **Job/Artifact:** per-job state and the validated output it produces
//! - **Outcome:** the structured success/failure record handed to callers

pub mod artifact;
pub mod metadata;
pub mod naming;
pub mod outcome;
pub mod request;

pub use artifact::*;
pub use metadata::*;
pub use naming::*;
pub use outcome::*;
pub use request::*;
