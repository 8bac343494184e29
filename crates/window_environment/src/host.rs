//! Host-side helpers for running environment side effects against browser services.

use std::rc::Rc;

use futures::future::Abortable;
use leptos::{logging, spawn_local, RwSignal, SignalUpdate};
use platform_host::{ContentFetchService, PrefsStore, ScriptSource};
use platform_host_web::{content_fetcher, host_strategy_name, prefs_store, viewport_size};

use crate::{
    environment::{Environment, RemoteLoad},
    model::{Viewport, WindowId},
    remote_content::fetch_remote_document,
};

#[derive(Clone)]
/// Host service bundle for the desktop environment.
pub struct DesktopHostContext {
    prefs: Rc<dyn PrefsStore>,
    fetcher: Rc<dyn ContentFetchService>,
    host_strategy_name: &'static str,
}

impl Default for DesktopHostContext {
    fn default() -> Self {
        Self {
            prefs: Rc::new(prefs_store()),
            fetcher: Rc::new(content_fetcher()),
            host_strategy_name: host_strategy_name(),
        }
    }
}

impl DesktopHostContext {
    /// Host bundle over explicit services, used by tests and embedders.
    pub fn new(prefs: Rc<dyn PrefsStore>, fetcher: Rc<dyn ContentFetchService>) -> Self {
        Self {
            prefs,
            fetcher,
            host_strategy_name: host_strategy_name(),
        }
    }

    pub fn prefs_store(&self) -> Rc<dyn PrefsStore> {
        self.prefs.clone()
    }

    pub fn content_fetcher(&self) -> Rc<dyn ContentFetchService> {
        self.fetcher.clone()
    }

    /// Returns the stable name of the selected host strategy.
    pub fn host_strategy_name(&self) -> &'static str {
        self.host_strategy_name
    }

    /// Desktop area available to windows: the browser viewport minus the taskbar.
    pub fn desktop_viewport(&self, taskbar_height_px: i32) -> Viewport {
        let (width, height) = viewport_size();
        Viewport::new(width, height - taskbar_height_px)
    }

    /// Runs `load` in the background and applies the result to `env` when it finishes.
    ///
    /// Aborted loads (the window was closed or reloaded) are dropped silently.
    pub fn spawn_remote_load(&self, env: RwSignal<Environment>, load: RemoteLoad) {
        let fetcher = self.content_fetcher();
        let RemoteLoad {
            ticket,
            abort_registration,
        } = load;
        spawn_local(async move {
            let fetch = fetch_remote_document(fetcher.as_ref(), &ticket.url);
            match Abortable::new(fetch, abort_registration).await {
                Ok(result) => env.update(|env| {
                    env.complete_remote_load(&ticket, result);
                }),
                Err(_) => logging::log!(
                    "remote load of `{}` for window `{}` cancelled",
                    ticket.url,
                    ticket.window_id
                ),
            }
        });
    }

    /// Executes scripts from a remote document inside the window's content element.
    pub fn run_window_scripts(&self, window_id: &WindowId, scripts: &[ScriptSource]) {
        if let Err(err) =
            platform_host_web::run_window_scripts(&window_id.content_dom_id(), scripts)
        {
            logging::warn!("script execution in window `{window_id}` failed: {err}");
        }
    }
}
