//! meshio - mesh and solution field I/O
//!
//! Structured access to the meshes and vertex fields exchanged between the
//! mesh-adaptation tool and the flow solver.
//!
//! # Architecture
//!
//! ```text
//! file ──codec──▶ RawMesh (flat buffers) ──reshape──▶ MeshData + FieldData
//!                                                        │
//!                                                create_sensor
//!                                                        ▼
//! file ◀──codec── RawMesh ◀──────flatten───────── MeshData (sensor)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use meshio::{MeditCodec, SensorKind, create_sensor, read_mesh, write_solution};
//!
//! let flow = read_mesh(&MeditCodec, "flow.mesh".as_ref(), Some("flow.sol".as_ref()))?;
//! let sensor = create_sensor(&flow, SensorKind::Mach)?;
//! write_solution(&MeditCodec, "mach.sol".as_ref(), &sensor)?;
//! ```

pub mod cli;
pub mod codec;
mod error;
pub mod medit;
pub mod mesh;
pub mod sensor;

pub use codec::{MeshCodec, RawMesh};
pub use error::DataError;
pub use medit::MeditCodec;
pub use mesh::{Dimension, FieldData, MeshData, read_mesh, write_mesh, write_solution};
pub use sensor::{SensorKind, create_sensor, create_sensor_named};
