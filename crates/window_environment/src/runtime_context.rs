//! Runtime provider and context wiring for the desktop shell.
//!
//! This module owns the long-lived [`Environment`] signal and host bootstrap wiring. UI
//! composition stays in [`crate::components`].

use leptos::*;

use crate::{
    environment::Environment,
    host::DesktopHostContext,
    model::{EnvironmentConfig, SessionInfo},
};

#[derive(Clone, Copy)]
/// Leptos context for reading and driving the desktop [`Environment`].
pub struct DesktopRuntimeContext {
    /// Host service bundle for side effects and browser queries.
    pub host: StoredValue<DesktopHostContext>,
    /// The environment. Mutate through [`DesktopRuntimeContext::update`].
    pub env: RwSignal<Environment>,
}

impl DesktopRuntimeContext {
    /// Applies `f` to the environment and notifies subscribers.
    pub fn update<T>(&self, f: impl FnOnce(&mut Environment) -> T) -> Option<T> {
        self.env.try_update(f)
    }

    /// Opens the window behind a desktop icon and starts its remote load, if any.
    pub fn launch_icon(&self, icon_id: &str) {
        let launch = self.update(|env| env.launch_icon(icon_id)).flatten();
        let Some(launch) = launch else {
            logging::warn!("desktop icon `{icon_id}` is not registered");
            return;
        };
        if let Some(load) = launch.remote_load {
            self.host.get_value().spawn_remote_load(self.env, load);
        }
    }
}

#[component]
/// Provides [`DesktopRuntimeContext`] to descendant components and restores persisted state.
pub fn DesktopProvider(
    /// Injected host bundle; defaults to the browser services selected at compile time.
    #[prop(optional)]
    host: Option<DesktopHostContext>,
    children: Children,
) -> impl IntoView {
    let host = host.unwrap_or_default();
    let prefs = host.prefs_store();
    let config = EnvironmentConfig::load(prefs.as_ref());
    let restore_on_boot = config.restore_on_boot;

    let session = SessionInfo::load(prefs.as_ref());
    let mut environment = Environment::new(config, prefs);
    environment.set_session(session);
    environment.set_viewport(host.desktop_viewport(crate::components::TASKBAR_HEIGHT_PX));
    if restore_on_boot {
        environment.restore_state();
    }
    logging::log!(
        "desktop environment ready on `{}` host with {} windows",
        host.host_strategy_name(),
        environment.windows().len()
    );

    let runtime = DesktopRuntimeContext {
        host: store_value(host),
        env: create_rw_signal(environment),
    };
    provide_context(runtime);

    children().into_view()
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`DesktopProvider`].
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}
