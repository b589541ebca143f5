//! texbake Render Engine
//!
//! Turns a render request into a validated, uniquely named artifact by
//! supervising an external headless renderer.
//!
//! # Pipeline Architecture
//!
//! ```text
//! model path ───┐
//!               ├── Metadata (model name, date token)
//! texture paths ┘         │
//!                         ├── Script instance (scratch copy of template)
//!                         │         │
//!                         ├── Output reservation (<model>_<date>_<ts>.glb)
//!                         │         │
//!                         ▼         ▼
//!               renderer --background --python <script> -- ...
//!                         │
//!                         ▼
//!               Output validation (exists, regular, non-empty)
//!                         │
//!                         ▼
//!                  /models/<artifact>
//! ```

pub mod executor;
pub mod inputs;
pub mod launcher;
pub mod orchestrator;
pub mod output;
pub mod script;
pub mod service;
pub mod validate;

pub use executor::{build_argument_vector, locate_executable, RenderExecutor};
pub use inputs::InputResolver;
pub use launcher::{ExitReport, OutputStream, ProcessLauncher, RenderCommand, SystemLauncher};
pub use orchestrator::RenderOrchestrator;
pub use output::OutputReservation;
pub use script::{ScriptInstance, ScriptProvisioner};
pub use service::RenderService;
pub use validate::OutputValidator;
