//! The desktop environment: window collection, z-order, pointer ownership, taskbar pins,
//! desktop icons, the window-type registry, and persistence.
//!
//! Every operation that touches a window goes through the environment, which drains the window's
//! emitted events afterwards and reacts to them (removal, reordering, persistence, pins, icons).

use std::{collections::BTreeMap, rc::Rc};

use futures::future::{AbortHandle, AbortRegistration};
use leptos::logging;
use platform_host::{PrefsStore, ScriptSource};

use crate::{
    emitter::ListenerId,
    model::{
        DesktopIcon, EnvironmentConfig, EnvironmentSnapshot, PointerPosition, ResizeHandle,
        SessionInfo, TaskbarPin, Viewport, WindowConfig, WindowEventKind, WindowId,
    },
    persistence::{
        clear_layout_snapshot, load_layout_snapshot, save_layout_snapshot, PersistScheduler,
        PersistenceError,
    },
    registry::{builtin_window_types, WindowClass, WindowType, WindowTypeRegistry},
    remote_content::{RemoteContentError, RemoteDocument, LOADING_TITLE},
    window::{Window, WindowEvent},
    window_manager::cascade_rect,
};

/// Named handler that declarative [`crate::model::EventBinding`]s resolve to.
pub type EventHandler = Rc<dyn Fn(&WindowId, &WindowEvent)>;

/// Identifies one remote load so stale completions can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLoadTicket {
    pub window_id: WindowId,
    pub generation: u64,
    pub url: String,
}

/// A remote load the host has to perform: fetch `ticket.url` under `abort_registration`, then
/// hand the result to [`Environment::complete_remote_load`].
#[derive(Debug)]
pub struct RemoteLoad {
    pub ticket: RemoteLoadTicket,
    pub abort_registration: AbortRegistration,
}

/// Result of [`Environment::launch_icon`].
#[derive(Debug)]
pub struct IconLaunch {
    pub window_id: WindowId,
    pub remote_load: Option<RemoteLoad>,
}

pub struct Environment {
    config: EnvironmentConfig,
    viewport: Viewport,
    /// Back-to-front; the last window is on top.
    windows: Vec<Window>,
    pins: Vec<TaskbarPin>,
    icons: BTreeMap<String, DesktopIcon>,
    registry: WindowTypeRegistry,
    handlers: BTreeMap<String, EventHandler>,
    interaction_owner: Option<WindowId>,
    next_window_number: u64,
    next_load_generation: u64,
    store: Rc<dyn PrefsStore>,
    scheduler: PersistScheduler,
    session: SessionInfo,
    restoring: bool,
}

impl Environment {
    /// Environment with the built-in window types and their desktop icons.
    pub fn new(config: EnvironmentConfig, store: Rc<dyn PrefsStore>) -> Self {
        let mut environment =
            Self::with_registry(config, store, WindowTypeRegistry::with_builtin_types());
        for manifest in builtin_window_types()
            .iter()
            .filter(|manifest| manifest.show_on_desktop)
        {
            let icon = manifest.desktop_icon();
            environment.icons.insert(icon.id.clone(), icon);
        }
        environment
    }

    pub fn with_registry(
        config: EnvironmentConfig,
        store: Rc<dyn PrefsStore>,
        registry: WindowTypeRegistry,
    ) -> Self {
        Self {
            scheduler: PersistScheduler::new(config.persist_interval_ms),
            config,
            viewport: Viewport::default(),
            windows: Vec::new(),
            pins: Vec::new(),
            icons: BTreeMap::new(),
            registry,
            handlers: BTreeMap::new(),
            interaction_owner: None,
            next_window_number: 0,
            next_load_generation: 0,
            store,
            session: SessionInfo::default(),
            restoring: false,
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Windows back-to-front.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(|w| w.id().clone()).collect()
    }

    pub fn window(&self, id: &WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    fn window_mut(&mut self, id: &WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    fn index_of(&self, id: &WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == id)
    }

    pub fn contains(&self, id: &WindowId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn pins(&self) -> &[TaskbarPin] {
        &self.pins
    }

    pub fn icons(&self) -> impl Iterator<Item = &DesktopIcon> {
        self.icons.values()
    }

    pub fn icon(&self, icon_id: &str) -> Option<&DesktopIcon> {
        self.icons.get(icon_id)
    }

    pub fn registry(&self) -> &WindowTypeRegistry {
        &self.registry
    }

    pub fn register_window_type(&mut self, descriptor: Rc<dyn WindowType>) {
        self.registry.register(descriptor);
    }

    pub fn interaction_owner(&self) -> Option<&WindowId> {
        self.interaction_owner.as_ref()
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    pub fn set_session(&mut self, session: SessionInfo) {
        self.session = session;
    }

    /// Top-most window that is not minimized.
    pub fn focused_window(&self) -> Option<&WindowId> {
        self.windows
            .iter()
            .rev()
            .find(|w| !w.is_minimized())
            .map(Window::id)
    }

    /// Makes `handler` available to event bindings naming `name`.
    pub fn register_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&WindowId, &WindowEvent) + 'static,
    ) {
        self.handlers.insert(name.into(), Rc::new(handler));
    }

    /// Subscribes `handler` to `kind` events of window `id`.
    pub fn on(
        &mut self,
        id: &WindowId,
        kind: WindowEventKind,
        handler: impl FnMut(&WindowEvent) + 'static,
    ) -> Option<ListenerId> {
        Some(self.window_mut(id)?.on(kind, handler))
    }

    pub fn off(&mut self, id: &WindowId, listener: ListenerId) -> bool {
        self.window_mut(id)
            .map_or(false, |window| window.off(listener))
    }

    /// Builds a window of `class` and puts it on top.
    ///
    /// A duplicate `id` is logged and the existing window returned unchanged. Unknown type names
    /// fall back to the base type; unregistered descriptors are registered with `config` as their
    /// defaults. Fields absent from `config` are back-filled from the registered defaults.
    pub fn create_window(
        &mut self,
        id: impl Into<WindowId>,
        class: impl Into<WindowClass>,
        config: WindowConfig,
    ) -> &Window {
        let id = id.into();
        if let Some(index) = self.index_of(&id) {
            logging::warn!("window `{id}` already exists; keeping the existing window");
            return &self.windows[index];
        }

        let entry = match class.into() {
            WindowClass::Named(name) => match self.registry.get(&name) {
                Some(entry) => entry.clone(),
                None => {
                    logging::warn!("window type `{name}` is not registered; using the base type");
                    self.registry.base().clone()
                }
            },
            WindowClass::Descriptor(descriptor) => {
                let name = descriptor.type_name().to_string();
                if !self.registry.contains(&name) {
                    let defaults = config.clone().backfill(&descriptor.default_config());
                    self.registry.register_with_defaults(descriptor, defaults);
                }
                match self.registry.get(&name) {
                    Some(entry) => entry.clone(),
                    None => self.registry.base().clone(),
                }
            }
        };

        let config = self.placed_config(config.backfill(&entry.defaults));
        let mut window = entry
            .descriptor
            .construct(id.clone(), &config, self.viewport);
        if window.id() != &id {
            logging::warn!(
                "window type `{}` ignored the requested id `{id}`",
                entry.descriptor.type_name()
            );
            window = Window::new(id.clone(), entry.descriptor.type_name(), &config, self.viewport);
        }
        entry.descriptor.attach(&mut window);
        self.wire_bindings(&mut window);

        let index = self.windows.len();
        self.windows.push(window);
        self.update_z_indices();
        self.persist();
        &self.windows[index]
    }

    /// Fills size and position still missing after back-fill.
    fn placed_config(&self, mut config: WindowConfig) -> WindowConfig {
        let w = *config.width.get_or_insert(self.config.default_width);
        let h = *config.height.get_or_insert(self.config.default_height);
        if config.x.is_none() || config.y.is_none() {
            let rect = cascade_rect(
                self.windows.len(),
                self.config.cascade_step,
                w,
                h,
                self.viewport,
            );
            config.x.get_or_insert(rect.x);
            config.y.get_or_insert(rect.y);
        }
        config
    }

    fn wire_bindings(&self, window: &mut Window) {
        for binding in window.bindings().to_vec() {
            let Some(handler) = self.handlers.get(&binding.handler).cloned() else {
                logging::warn!(
                    "window `{}` binds `{}` to unknown handler `{}`",
                    window.id(),
                    binding.event,
                    binding.handler
                );
                continue;
            };
            let id = window.id().clone();
            window.on(binding.event, move |event| handler(&id, event));
        }
    }

    fn next_window_id(&mut self) -> WindowId {
        loop {
            self.next_window_number += 1;
            let id = WindowId::new(format!("window-{}", self.next_window_number));
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Opens a window under a fresh `window-N` id, pins it to the taskbar, and focuses it.
    pub fn new_window(&mut self, class: impl Into<WindowClass>, config: WindowConfig) -> WindowId {
        let id = self.next_window_id();
        let window = self.create_window(id.clone(), class, config);
        let pin = TaskbarPin {
            window_id: id.clone(),
            title: window.title().to_string(),
            icon: window.icon().map(str::to_string),
        };
        self.pins.push(pin);
        self.bring_to_front(&id);
        self.persist();
        id
    }

    /// Closes and removes `id`. Subscribers see `close` before the window is dropped.
    pub fn remove_window(&mut self, id: &WindowId) {
        let Some(window) = self.window_mut(id) else {
            return;
        };
        window.close();
        self.dispatch(id);
    }

    /// Titlebar close button.
    pub fn close_window(&mut self, id: &WindowId) {
        self.remove_window(id);
    }

    fn evict(&mut self, id: &WindowId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let mut window = self.windows.remove(index);
        window.cancel_remote_load();
        self.pins.retain(|pin| &pin.window_id != id);
        self.release_owner(id);
        self.update_z_indices();
        self.persist();
    }

    /// Moves `id` to the top of the stack.
    pub fn bring_to_front(&mut self, id: &WindowId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        if index + 1 == self.windows.len() {
            return;
        }
        let window = self.windows.remove(index);
        self.windows.push(window);
        self.update_z_indices();
        self.persist();
    }

    /// Assigns `base + k` to the `k`-th window from the back.
    pub fn update_z_indices(&mut self) {
        let base = self.config.z_index_base;
        for (position, window) in self.windows.iter_mut().enumerate() {
            window.set_z_index(base + position as u32);
        }
    }

    pub fn focus_window(&mut self, id: &WindowId) {
        if let Some(window) = self.window_mut(id) {
            window.focus();
            self.dispatch(id);
        }
    }

    /// Ends the interaction of any owner other than `id`.
    fn end_foreign_interaction(&mut self, id: &WindowId) {
        let Some(owner) = self.interaction_owner.clone() else {
            return;
        };
        if &owner == id {
            return;
        }
        if let Some(window) = self.window_mut(&owner) {
            window.pointer_up();
            self.dispatch(&owner);
        }
        self.interaction_owner = None;
    }

    /// Pointer down on the titlebar of `id`.
    pub fn begin_drag(&mut self, id: &WindowId, pointer: PointerPosition) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.end_foreign_interaction(id);
        self.focus_window(id);
        let started = self
            .window_mut(id)
            .map_or(false, |window| window.begin_drag(pointer));
        self.dispatch(id);
        started
    }

    /// Pointer down on a resize grip of `id`.
    pub fn begin_resize(
        &mut self,
        id: &WindowId,
        handle: ResizeHandle,
        pointer: PointerPosition,
    ) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.end_foreign_interaction(id);
        self.focus_window(id);
        let started = self
            .window_mut(id)
            .map_or(false, |window| window.begin_resize(handle, pointer));
        if started {
            self.interaction_owner = Some(id.clone());
        }
        started
    }

    pub fn pointer_move(&mut self, pointer: PointerPosition) {
        let Some(owner) = self.interaction_owner.clone() else {
            return;
        };
        let viewport = self.viewport;
        match self.window_mut(&owner) {
            Some(window) => window.pointer_move(pointer, viewport),
            None => {
                self.interaction_owner = None;
                return;
            }
        }
        self.dispatch(&owner);
    }

    /// Ends the current interaction and writes any pending snapshot.
    pub fn pointer_up(&mut self) {
        if let Some(owner) = self.interaction_owner.take() {
            if let Some(window) = self.window_mut(&owner) {
                window.pointer_up();
                self.dispatch(&owner);
            }
        }
        if self.scheduler.is_dirty() {
            self.write_snapshot();
        }
    }

    pub fn toggle_minimize(&mut self, id: &WindowId) {
        if let Some(window) = self.window_mut(id) {
            window.toggle_minimize();
            self.dispatch(id);
        }
    }

    /// Taskbar pin click: restores a minimized window, minimizes the focused one, and focuses
    /// any other.
    pub fn activate_pin(&mut self, id: &WindowId) {
        let Some(window) = self.window(id) else {
            return;
        };
        if window.is_minimized() {
            if let Some(window) = self.window_mut(id) {
                window.restore();
            }
            self.dispatch(id);
            self.bring_to_front(id);
        } else if self.focused_window() == Some(id) {
            if let Some(window) = self.window_mut(id) {
                window.minimize();
            }
            self.dispatch(id);
        } else {
            self.bring_to_front(id);
        }
    }

    /// Asks window `id` to open a `class_name` window with `config`.
    pub fn request_popup(&mut self, id: &WindowId, class_name: &str, config: WindowConfig) {
        if let Some(window) = self.window_mut(id) {
            window.request_popup(class_name, config);
            self.dispatch(id);
        }
    }

    pub fn export_icon_config(&mut self, id: &WindowId, icon: DesktopIcon) {
        if let Some(window) = self.window_mut(id) {
            window.export_icon_config(icon);
            self.dispatch(id);
        }
    }

    pub fn set_taskbar_title(&mut self, id: &WindowId, title: &str) {
        if let Some(window) = self.window_mut(id) {
            window.set_taskbar_title(title);
            self.dispatch(id);
        }
    }

    /// Updates the desktop size and re-clamps every window into it. Not persisted on its own.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        for window in &mut self.windows {
            window.fit_to_viewport(viewport);
        }
    }

    /// Opens the window behind desktop icon `icon_id`, starting its remote load if it has one.
    pub fn launch_icon(&mut self, icon_id: &str) -> Option<IconLaunch> {
        let icon = self.icons.get(icon_id)?.clone();
        let mut config = icon.config.clone();
        if config.icon.is_none() {
            config.icon = icon.icon.clone();
        }
        let window_id = self.new_window(icon.class_name.as_str(), config);
        let remote_load = icon
            .remote_url
            .as_deref()
            .and_then(|url| self.begin_remote_load(&window_id, url));
        Some(IconLaunch {
            window_id,
            remote_load,
        })
    }

    fn release_owner(&mut self, id: &WindowId) {
        if self.interaction_owner.as_ref() == Some(id) {
            self.interaction_owner = None;
        }
    }

    /// Drains and reacts to the events window `id` emitted.
    fn dispatch(&mut self, id: &WindowId) {
        let Some(window) = self.window_mut(id) else {
            return;
        };
        for event in window.take_events() {
            self.react(id, event);
        }
    }

    fn react(&mut self, id: &WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Close => self.evict(id),
            WindowEvent::Focus => self.bring_to_front(id),
            WindowEvent::DragStart => self.interaction_owner = Some(id.clone()),
            WindowEvent::Drag => self.persist(),
            WindowEvent::DragEnd | WindowEvent::Resize | WindowEvent::Minimize => {
                self.release_owner(id);
                self.persist();
            }
            WindowEvent::Popup(request) => {
                self.new_window(request.class_name, request.config);
            }
            WindowEvent::ExportIconConfig(icon) => {
                self.icons.insert(icon.id.clone(), icon);
            }
            WindowEvent::ChangeTaskbarTitle(title) => {
                if let Some(pin) = self.pins.iter_mut().find(|pin| &pin.window_id == id) {
                    pin.title = title;
                }
                self.persist();
            }
        }
    }

    /// Requests a snapshot write. Writes now when no interaction is running; otherwise the
    /// write waits for [`Environment::flush_persistence`] or pointer release.
    fn persist(&mut self) {
        if self.restoring {
            return;
        }
        self.scheduler.mark_dirty();
        if self.interaction_owner.is_none() {
            self.write_snapshot();
        }
    }

    fn write_snapshot(&mut self) {
        if let Err(err) = self.save_state() {
            logging::warn!("desktop snapshot write failed: {err}");
            self.scheduler.mark_clean();
        }
    }

    /// Periodic tick: writes a pending snapshot at most once per `persist_interval_ms`.
    pub fn flush_persistence(&mut self, now_ms: u64) -> bool {
        if !self.scheduler.should_flush(now_ms) {
            return false;
        }
        self.write_snapshot();
        self.scheduler.record_flush(now_ms);
        true
    }

    pub fn has_pending_writes(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            windows: self.windows.iter().map(Window::get_state).collect(),
        }
    }

    /// Writes the snapshot under the configured key.
    pub fn save_state(&mut self) -> Result<(), PersistenceError> {
        save_layout_snapshot(
            self.store.as_ref(),
            &self.config.snapshot_key,
            &self.snapshot(),
        )?;
        self.scheduler.mark_clean();
        Ok(())
    }

    /// Rebuilds windows from the stored snapshot. Missing or corrupt snapshots leave the desktop
    /// as it is. Returns the number of windows restored.
    pub fn restore_state(&mut self) -> usize {
        match load_layout_snapshot(self.store.as_ref(), &self.config.snapshot_key) {
            Ok(Some(snapshot)) => self.restore_snapshot(snapshot),
            Ok(None) => 0,
            Err(err) => {
                logging::warn!("ignoring unreadable desktop snapshot: {err}");
                0
            }
        }
    }

    /// Recreates every window in `snapshot` with its geometry, type, minimized flag and taskbar
    /// pin.
    pub fn restore_snapshot(&mut self, snapshot: EnvironmentSnapshot) -> usize {
        let mut states = snapshot.windows;
        states.sort_by_key(|state| state.z_index);

        self.restoring = true;
        let mut restored = 0;
        for state in states {
            if self.contains(&state.id) {
                logging::warn!("snapshot window `{}` already exists; skipped", state.id);
                continue;
            }
            let id = state.id.clone();
            self.create_window(id.clone(), state.class_name.clone(), state.to_config());
            let Some(window) = self.window_mut(&id) else {
                continue;
            };
            window.set_minimized_silently(state.is_minimized);
            let pin = TaskbarPin {
                window_id: id.clone(),
                title: window.title().to_string(),
                icon: window.icon().map(str::to_string),
            };
            self.pins.push(pin);
            if let Some(number) = id
                .as_str()
                .strip_prefix("window-")
                .and_then(|raw| raw.parse::<u64>().ok())
            {
                self.next_window_number = self.next_window_number.max(number);
            }
            restored += 1;
        }
        self.restoring = false;
        self.update_z_indices();
        logging::log!("restored {restored} desktop windows");
        restored
    }

    /// Deletes the stored snapshot. Open windows are untouched.
    pub fn clear_state(&mut self) -> Result<(), PersistenceError> {
        clear_layout_snapshot(self.store.as_ref(), &self.config.snapshot_key)
    }

    /// Puts window `id` into its loading state and returns the fetch the host has to run.
    pub fn begin_remote_load(&mut self, id: &WindowId, url: &str) -> Option<RemoteLoad> {
        if !self.contains(id) {
            return None;
        }
        self.next_load_generation += 1;
        let generation = self.next_load_generation;
        let (abort, abort_registration) = AbortHandle::new_pair();
        self.window_mut(id)?
            .start_remote_load(generation, LOADING_TITLE, abort);
        Some(RemoteLoad {
            ticket: RemoteLoadTicket {
                window_id: id.clone(),
                generation,
                url: url.to_string(),
            },
            abort_registration,
        })
    }

    /// Applies a finished fetch. Returns `false` when the window is gone or a newer load
    /// superseded this one. Failures are logged and the previous title and content restored.
    pub fn complete_remote_load(
        &mut self,
        ticket: &RemoteLoadTicket,
        result: Result<RemoteDocument, RemoteContentError>,
    ) -> bool {
        let Some(window) = self.window_mut(&ticket.window_id) else {
            return false;
        };
        let Some(pending) = window.finish_remote_load(ticket.generation) else {
            return false;
        };
        match result {
            Ok(document) => {
                window.set_content(document.body);
                window.queue_scripts(document.scripts);
                window.set_taskbar_title(document.title);
            }
            Err(err) => {
                logging::warn!(
                    "loading `{}` into window `{}` failed: {err}",
                    ticket.url,
                    ticket.window_id
                );
                window.revert_remote_load(pending);
                self.persist();
            }
        }
        self.dispatch(&ticket.window_id);
        true
    }

    /// Scripts window `id` still has to run after its content was mounted.
    pub fn take_pending_scripts(&mut self, id: &WindowId) -> Vec<ScriptSource> {
        self.window_mut(id)
            .map(Window::take_pending_scripts)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::{executor::block_on, future::Abortable};
    use platform_host::{MemoryContentFetcher, MemoryPrefsStore};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        model::{EventBinding, WindowRect, SNAPSHOT_KEY},
        remote_content::fetch_remote_document,
        window_manager::rect_within,
    };

    fn environment() -> (Environment, MemoryPrefsStore) {
        let store = MemoryPrefsStore::default();
        let mut env = Environment::new(EnvironmentConfig::default(), Rc::new(store.clone()));
        env.set_viewport(Viewport::new(1000, 800));
        (env, store)
    }

    fn ids(env: &Environment) -> Vec<String> {
        env.windows().iter().map(|w| w.id().to_string()).collect()
    }

    fn z_indices(env: &Environment) -> Vec<u32> {
        env.windows().iter().map(Window::z_index).collect()
    }

    fn stored_snapshot(store: &MemoryPrefsStore) -> EnvironmentSnapshot {
        load_layout_snapshot(store, SNAPSHOT_KEY)
            .expect("snapshot readable")
            .expect("snapshot stored")
    }

    #[test]
    fn bring_to_front_reorders_and_renumbers() {
        let (mut env, _) = environment();
        env.create_window("A", "window", WindowConfig::sized(600, 400));
        env.create_window("B", "window", WindowConfig::sized(300, 200));
        assert_eq!(z_indices(&env), vec![100, 101]);

        env.bring_to_front(&WindowId::new("A"));

        assert_eq!(ids(&env), vec!["B", "A"]);
        assert_eq!(z_indices(&env), vec![100, 101]);
        assert_eq!(env.window(&WindowId::new("A")).map(Window::z_index), Some(101));
    }

    #[test]
    fn bring_to_front_and_remove_are_idempotent() {
        let (mut env, _) = environment();
        env.create_window("A", "window", WindowConfig::default());
        env.create_window("B", "window", WindowConfig::default());
        let a = WindowId::new("A");

        env.bring_to_front(&a);
        env.bring_to_front(&a);
        assert_eq!(ids(&env), vec!["B", "A"]);

        env.remove_window(&a);
        env.remove_window(&a);
        env.bring_to_front(&WindowId::new("missing"));
        assert_eq!(ids(&env), vec!["B"]);
        assert_eq!(z_indices(&env), vec![100]);
    }

    #[test]
    fn duplicate_id_returns_the_existing_window() {
        let (mut env, _) = environment();
        env.create_window("A", "window", WindowConfig::default().with_title("First"));
        let title = env
            .create_window("A", "window", WindowConfig::default().with_title("Second"))
            .title()
            .to_string();

        assert_eq!(title, "First");
        assert_eq!(env.windows().len(), 1);
    }

    #[test]
    fn unknown_type_falls_back_to_base_defaults() {
        let (mut env, _) = environment();
        let window = env.create_window("A", "no-such-type", WindowConfig::default());
        assert_eq!(window.class_name(), "window");
        assert_eq!((window.rect().w, window.rect().h), (600, 400));
        assert_eq!(window.title(), "Untitled");
    }

    #[test]
    fn registered_defaults_fill_missing_fields() {
        let (mut env, _) = environment();
        let window = env.create_window("P", "popup", WindowConfig::default().with_title("Hey"));
        assert_eq!(window.title(), "Hey");
        assert_eq!((window.rect().w, window.rect().h), (320, 160));
        assert_eq!(window.icon(), Some("info"));
    }

    struct Counter;

    impl WindowType for Counter {
        fn type_name(&self) -> &str {
            "counter"
        }

        fn default_config(&self) -> WindowConfig {
            WindowConfig::sized(250, 150).with_title("Counter")
        }
    }

    #[test]
    fn descriptors_register_on_first_use() {
        let (mut env, _) = environment();
        let descriptor: Rc<dyn WindowType> = Rc::new(Counter);
        env.create_window(
            "c1",
            descriptor.clone(),
            WindowConfig::default().with_title("Tally"),
        );
        assert!(env.registry().contains("counter"));

        let second = env.create_window("c2", "counter", WindowConfig::default());
        assert_eq!(second.title(), "Tally");
        assert_eq!(second.rect().w, 250);
    }

    #[test]
    fn new_window_pins_and_focuses() {
        let (mut env, store) = environment();
        let first = env.new_window("window", WindowConfig::default().with_title("One"));
        let second = env.new_window("window", WindowConfig::default().with_title("Two"));

        assert_eq!(first.as_str(), "window-1");
        assert_eq!(second.as_str(), "window-2");
        assert_eq!(env.pins().len(), 2);
        assert_eq!(env.focused_window(), Some(&second));
        assert_eq!(stored_snapshot(&store).windows.len(), 2);
    }

    #[test]
    fn new_window_skips_ids_in_use() {
        let (mut env, _) = environment();
        env.create_window("window-1", "window", WindowConfig::default());
        let id = env.new_window("window", WindowConfig::default());
        assert_eq!(id.as_str(), "window-2");
    }

    #[test]
    fn close_removes_window_pin_and_ownership() {
        let (mut env, store) = environment();
        let id = env.new_window("window", WindowConfig::default());
        let closed = Rc::new(RefCell::new(false));
        {
            let closed = closed.clone();
            env.on(&id, WindowEventKind::Close, move |_| *closed.borrow_mut() = true);
        }
        env.begin_drag(&id, PointerPosition::new(10, 10));

        env.close_window(&id);

        assert!(*closed.borrow());
        assert!(env.windows().is_empty());
        assert!(env.pins().is_empty());
        assert_eq!(env.interaction_owner(), None);
        assert!(stored_snapshot(&store).windows.is_empty());
    }

    #[test]
    fn drag_scenario_clamps_and_persists_on_release() {
        let (mut env, store) = environment();
        let id = WindowId::new("A");
        env.create_window("A", "window", WindowConfig::sized(600, 400).at(50, 50));
        let writes = store.write_count();

        assert!(env.begin_drag(&id, PointerPosition::new(100, 100)));
        assert_eq!(env.interaction_owner(), Some(&id));
        env.pointer_move(PointerPosition::new(50, 80));
        assert_eq!(store.write_count(), writes);
        env.pointer_up();

        let rect = env.window(&id).map(Window::rect).expect("window");
        assert_eq!((rect.x, rect.y), (0, 30));
        assert_eq!(env.interaction_owner(), None);
        assert_eq!(store.write_count(), writes + 1);
        assert_eq!(stored_snapshot(&store).windows[0].x, 0);
    }

    #[test]
    fn resize_scenarios() {
        let (mut env, _) = environment();
        let id = WindowId::new("A");
        env.create_window("A", "window", WindowConfig::sized(600, 400).at(50, 50));

        env.begin_resize(&id, ResizeHandle::SouthEast, PointerPosition::new(650, 450));
        env.pointer_move(PointerPosition::new(700, 450));
        env.pointer_up();
        assert_eq!(
            env.window(&id).map(Window::rect),
            Some(WindowRect {
                x: 50,
                y: 50,
                w: 650,
                h: 400
            })
        );

        env.create_window("B", "window", WindowConfig::sized(600, 400).at(100, 100));
        let b = WindowId::new("B");
        env.begin_resize(&b, ResizeHandle::NorthWest, PointerPosition::new(100, 100));
        env.pointer_move(PointerPosition::new(50, 50));
        env.pointer_up();
        assert_eq!(
            env.window(&b).map(Window::rect),
            Some(WindowRect {
                x: 50,
                y: 50,
                w: 650,
                h: 450
            })
        );
    }

    #[test]
    fn starting_a_second_interaction_ends_the_first() {
        let (mut env, _) = environment();
        let a = WindowId::new("A");
        let b = WindowId::new("B");
        env.create_window("A", "window", WindowConfig::sized(300, 200).at(0, 0));
        env.create_window("B", "window", WindowConfig::sized(300, 200).at(400, 0));

        env.begin_drag(&a, PointerPosition::new(10, 10));
        env.begin_resize(&b, ResizeHandle::SouthEast, PointerPosition::new(700, 200));

        assert_eq!(env.interaction_owner(), Some(&b));
        let interacting: Vec<bool> = env.windows().iter().map(Window::is_interacting).collect();
        assert_eq!(interacting.iter().filter(|busy| **busy).count(), 1);
        assert_eq!(env.focused_window(), Some(&b));
    }

    #[test]
    fn drag_writes_are_rate_limited() {
        let (mut env, store) = environment();
        let id = WindowId::new("A");
        env.create_window("A", "window", WindowConfig::sized(300, 200).at(0, 0));
        env.begin_drag(&id, PointerPosition::new(0, 0));
        let writes = store.write_count();

        env.pointer_move(PointerPosition::new(10, 10));
        assert!(env.flush_persistence(1_000));
        env.pointer_move(PointerPosition::new(20, 20));
        assert!(!env.flush_persistence(1_100));
        assert!(env.has_pending_writes());
        assert!(env.flush_persistence(1_300));

        assert_eq!(store.write_count(), writes + 2);
    }

    #[test]
    fn minimize_toggle_keeps_geometry() {
        let (mut env, store) = environment();
        let id = WindowId::new("A");
        env.create_window("A", "window", WindowConfig::sized(300, 200).at(70, 90));
        let before = env.window(&id).map(Window::rect);

        env.toggle_minimize(&id);
        assert_eq!(env.window(&id).map(Window::is_minimized), Some(true));
        assert!(stored_snapshot(&store).windows[0].is_minimized);
        env.toggle_minimize(&id);

        assert_eq!(env.window(&id).map(Window::rect), before);
        assert_eq!(env.window(&id).map(Window::is_minimized), Some(false));
    }

    #[test]
    fn pin_activation_cycles_focus_minimize_restore() {
        let (mut env, _) = environment();
        let a = env.new_window("window", WindowConfig::default());
        let b = env.new_window("window", WindowConfig::default());

        env.activate_pin(&a);
        assert_eq!(env.focused_window(), Some(&a));

        env.activate_pin(&a);
        assert_eq!(env.window(&a).map(Window::is_minimized), Some(true));
        assert_eq!(env.focused_window(), Some(&b));

        env.activate_pin(&a);
        assert_eq!(env.window(&a).map(Window::is_minimized), Some(false));
        assert_eq!(env.focused_window(), Some(&a));
    }

    #[test]
    fn popup_opens_a_pinned_window() {
        let (mut env, _) = environment();
        let parent = env.new_window("window", WindowConfig::default());

        env.request_popup(&parent, "popup", WindowConfig::default().with_title("Saved"));

        assert_eq!(env.windows().len(), 2);
        let top = env.windows().last().expect("popup");
        assert_eq!(top.class_name(), "popup");
        assert_eq!(top.title(), "Saved");
        assert_eq!(env.pins().len(), 2);
    }

    #[test]
    fn exported_icons_appear_on_the_desktop() {
        let (mut env, _) = environment();
        let id = env.new_window("window", WindowConfig::default());
        let icon = DesktopIcon {
            id: "shortcut".to_string(),
            label: "Shortcut".to_string(),
            icon: None,
            class_name: "notes".to_string(),
            config: WindowConfig::default(),
            remote_url: None,
        };

        env.export_icon_config(&id, icon.clone());

        assert_eq!(env.icon("shortcut"), Some(&icon));
        let launched = env.launch_icon("shortcut").expect("launch");
        assert!(launched.remote_load.is_none());
        assert_eq!(
            env.window(&launched.window_id).map(Window::class_name),
            Some("notes")
        );
    }

    #[test]
    fn taskbar_title_follows_the_window() {
        let (mut env, store) = environment();
        let id = env.new_window("window", WindowConfig::default().with_title("Old"));

        env.set_taskbar_title(&id, "New");

        assert_eq!(env.pins()[0].title, "New");
        assert_eq!(stored_snapshot(&store).windows[0].title, "New");
    }

    #[test]
    fn viewport_shrink_reclamps_windows() {
        let (mut env, _) = environment();
        let id = WindowId::new("A");
        env.create_window("A", "window", WindowConfig::sized(400, 300).at(500, 400));

        env.set_viewport(Viewport::new(600, 500));

        assert_eq!(
            env.window(&id).map(Window::rect),
            Some(WindowRect {
                x: 200,
                y: 200,
                w: 400,
                h: 300
            })
        );
    }

    #[test]
    fn bindings_resolve_to_named_handlers() {
        let (mut env, _) = environment();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            env.register_handler("log", move |id, event| {
                seen.borrow_mut().push(format!("{id}:{}", event.kind()));
            });
        }
        let config = WindowConfig {
            events: Some(vec![
                EventBinding::new(WindowEventKind::Focus, "log"),
                EventBinding::new(WindowEventKind::Close, "missing"),
            ]),
            ..WindowConfig::default()
        };
        env.create_window("A", "window", config);
        let a = WindowId::new("A");

        env.focus_window(&a);
        env.remove_window(&a);

        assert_eq!(*seen.borrow(), vec!["A:focus".to_string()]);
    }

    #[test]
    fn save_restore_save_is_stable() {
        let (mut env, store) = environment();
        let a = env.new_window("notes", WindowConfig::default().at(30, 40));
        env.new_window("popup", WindowConfig::default());
        env.toggle_minimize(&a);
        env.save_state().expect("save");
        let first = store.raw(SNAPSHOT_KEY).expect("first save");

        let mut restored =
            Environment::new(EnvironmentConfig::default(), Rc::new(store.clone()));
        restored.set_viewport(Viewport::new(1000, 800));
        assert_eq!(restored.restore_state(), 2);
        restored.save_state().expect("second save");

        assert_eq!(store.raw(SNAPSHOT_KEY), Some(first));
        assert_eq!(restored.pins().len(), 2);
        assert_eq!(restored.window(&a).map(Window::is_minimized), Some(true));
        let next = restored.new_window("window", WindowConfig::default());
        assert_eq!(next.as_str(), "window-3");
    }

    #[test]
    fn corrupt_snapshot_restores_nothing() {
        let (mut env, store) = environment();
        store.save_pref(SNAPSHOT_KEY, "{\"windows\": 7}").expect("seed");
        assert_eq!(env.restore_state(), 0);
        assert!(env.windows().is_empty());
    }

    #[test]
    fn clear_state_deletes_the_snapshot() {
        let (mut env, store) = environment();
        env.new_window("window", WindowConfig::default());
        env.clear_state().expect("clear");
        assert_eq!(store.raw(SNAPSHOT_KEY), None);
        assert_eq!(env.windows().len(), 1);
    }

    fn run_load(env: &mut Environment, fetcher: &MemoryContentFetcher, load: RemoteLoad) -> bool {
        let result = block_on(Abortable::new(
            fetch_remote_document(fetcher, &load.ticket.url),
            load.abort_registration,
        ))
        .expect("not aborted");
        env.complete_remote_load(&load.ticket, result)
    }

    #[test]
    fn remote_load_replaces_title_content_and_queues_scripts() {
        let (mut env, store) = environment();
        let fetcher = MemoryContentFetcher::default();
        fetcher.insert_document(
            "https://site.test/page",
            200,
            "<title>Page</title><body><p>hi</p><script>go()</script></body>",
        );
        let id = env.new_window("browser", WindowConfig::default());

        let load = env
            .begin_remote_load(&id, "https://site.test/page")
            .expect("load");
        assert_eq!(env.window(&id).map(Window::title), Some(LOADING_TITLE));
        let writes = store.write_count();
        assert!(run_load(&mut env, &fetcher, load));
        assert_eq!(store.write_count(), writes + 1);

        let window = env.window(&id).expect("window");
        assert_eq!(window.title(), "Page");
        assert_eq!(window.content(), "<p>hi</p>");
        assert_eq!(env.pins()[0].title, "Page");
        assert_eq!(stored_snapshot(&store).windows[0].title, "Page");
        assert_eq!(
            env.take_pending_scripts(&id),
            vec![ScriptSource::Inline("go()".to_string())]
        );
        assert!(env.take_pending_scripts(&id).is_empty());
    }

    #[test]
    fn failed_remote_load_restores_previous_state() {
        let (mut env, store) = environment();
        let fetcher = MemoryContentFetcher::default();
        fetcher.insert_document("/missing", 404, "");
        let id = env.new_window(
            "window",
            WindowConfig {
                content: Some("<p>before</p>".to_string()),
                ..WindowConfig::default().with_title("Before")
            },
        );

        let load = env.begin_remote_load(&id, "/missing").expect("load");
        let writes = store.write_count();
        assert!(run_load(&mut env, &fetcher, load));
        assert_eq!(store.write_count(), writes + 1);

        let window = env.window(&id).expect("window");
        assert_eq!(window.title(), "Before");
        assert_eq!(stored_snapshot(&store).windows[0].title, "Before");
        assert_eq!(window.content(), "<p>before</p>");
    }

    #[test]
    fn stale_and_orphaned_loads_are_ignored() {
        let (mut env, _) = environment();
        let id = env.new_window("window", WindowConfig::default());
        let first = env.begin_remote_load(&id, "/a").expect("first");
        let second = env.begin_remote_load(&id, "/b").expect("second");

        let stale = RemoteDocument {
            title: "A".to_string(),
            body: String::new(),
            scripts: Vec::new(),
        };
        assert!(!env.complete_remote_load(&first.ticket, Ok(stale)));

        env.remove_window(&id);
        let aborted = block_on(Abortable::new(async {}, second.abort_registration));
        assert!(aborted.is_err());
        assert!(!env.complete_remote_load(&second.ticket, Err(RemoteContentError::MissingBody)));
    }

    #[test]
    fn launching_a_remote_icon_starts_its_load() {
        let (mut env, _) = environment();
        let launch = env.launch_icon("icon-browser").expect("browser icon");
        let load = launch.remote_load.expect("browser has a home page");
        assert_eq!(load.ticket.window_id, launch.window_id);
        assert_eq!(env.windows().len(), 1);
        assert!(env.launch_icon("icon-missing").is_none());
    }

    proptest! {
        #[test]
        fn z_order_stays_contiguous(ops in prop::collection::vec((0u8..4, 0usize..6), 1..40)) {
            let (mut env, _) = environment();
            for (op, slot) in ops {
                let id = WindowId::new(format!("w{slot}"));
                match op {
                    0 => {
                        env.create_window(id, "window", WindowConfig::default());
                    }
                    1 => env.remove_window(&id),
                    2 => env.bring_to_front(&id),
                    _ => env.activate_pin(&id),
                }
                let expected: Vec<u32> = (0..env.windows().len() as u32).map(|k| 100 + k).collect();
                prop_assert_eq!(z_indices(&env), expected);
                let mut unique = ids(&env);
                unique.sort();
                unique.dedup();
                prop_assert_eq!(unique.len(), env.windows().len());
            }
        }

        #[test]
        fn pointer_routing_keeps_windows_in_viewport(
            moves in prop::collection::vec((-2000i32..2000, -2000i32..2000), 1..20),
            resize in any::<bool>(),
        ) {
            let (mut env, _) = environment();
            let id = WindowId::new("A");
            env.create_window("A", "window", WindowConfig::sized(300, 200).at(100, 100));
            if resize {
                env.begin_resize(&id, ResizeHandle::NorthWest, PointerPosition::new(100, 100));
            } else {
                env.begin_drag(&id, PointerPosition::new(100, 100));
            }
            for (x, y) in moves {
                env.pointer_move(PointerPosition::new(x, y));
                let rect = env.window(&id).map(Window::rect).expect("window");
                prop_assert!(rect_within(rect, env.viewport()));
            }
            env.pointer_up();
            prop_assert_eq!(env.interaction_owner(), None);
        }
    }
}
