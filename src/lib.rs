//! Client for a REST task server: fetches the task list, projects it into a
//! view, keeps summary counts current and forwards user intents back to the
//! server, reloading after every change.

pub mod api;
pub mod board;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod html;
pub mod stats;
pub mod surface;
pub mod task;
pub mod ui;
pub mod view;

pub use api::{HttpTaskApi, TaskApi};
pub use controller::{Action, Controller, EditSurface};
pub use error::SyncError;
pub use surface::Surface;
pub use task::{Filter, Priority, Status, Task, TaskId};
