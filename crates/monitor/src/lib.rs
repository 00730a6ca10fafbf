#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod observation;
pub mod registry;
pub mod render;

pub use engine::MonitorEngine;
pub use error::Error;
pub use observation::{
    EventCursor, InotifyWatcher, ObservationSink, ProcessObservation, ProcfsScanner, WatchEntry,
    WatchEvent,
};
pub use registry::SeenRegistry;
pub use render::LinePrinter;
