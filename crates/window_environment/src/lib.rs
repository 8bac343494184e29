//! Browser desktop window environment.
//!
//! [`Environment`] owns a z-ordered collection of [`Window`]s, routes pointer input to the one
//! window that may drag or resize at a time, keeps taskbar pins and desktop icons in sync with
//! window events, and persists the layout through a [`platform_host::PrefsStore`]. The
//! [`components`] module renders it with Leptos.

pub mod components;
pub mod emitter;
pub mod environment;
pub mod host;
pub mod model;
pub mod persistence;
pub mod registry;
pub mod remote_content;
mod runtime_context;
pub mod window;
pub mod window_manager;

pub use components::{
    use_desktop_runtime, DesktopProvider, DesktopRuntimeContext, DesktopShell, TASKBAR_HEIGHT_PX,
};
pub use emitter::{EventEmitter, ListenerId};
pub use environment::{Environment, EventHandler, IconLaunch, RemoteLoad, RemoteLoadTicket};
pub use host::DesktopHostContext;
pub use model::*;
pub use persistence::PersistenceError;
pub use registry::{BaseWindowType, ManifestWindowType, WindowClass, WindowType, WindowTypeRegistry};
pub use remote_content::{
    fetch_remote_document, parse_remote_document, RemoteContentError, RemoteDocument,
};
pub use window::{Window, WindowEvent, WindowInteraction};
