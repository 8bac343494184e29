//! Single window: geometry, drag/resize/minimize state machine, and event emission.
//!
//! A [`Window`] never mutates anything outside itself. Every state change that the desktop cares
//! about is emitted twice: to the window's own [`EventEmitter`] subscribers, and to an outbox the
//! owning [`crate::Environment`] drains after each routed operation.

use std::collections::BTreeMap;

use futures::future::AbortHandle;
use platform_host::ScriptSource;
use serde_json::Value;

use crate::{
    emitter::{EventEmitter, ListenerId},
    model::{
        default_window_styles, DesktopIcon, EventBinding, PointerPosition, PopupRequest,
        ResizeHandle, Viewport, WindowConfig, WindowEventKind, WindowId, WindowRect, WindowState,
        DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
    },
    window_manager::{clamp_position, drag_rect, fit_rect, resize_rect},
};

/// Scratch state of a drag in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

/// Scratch state of a resize in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub handle: ResizeHandle,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowInteraction {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

/// Event emitted by a [`Window`], with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Close,
    Focus,
    DragStart,
    Drag,
    DragEnd,
    Minimize,
    Resize,
    Popup(PopupRequest),
    ExportIconConfig(DesktopIcon),
    ChangeTaskbarTitle(String),
}

impl WindowEvent {
    pub fn kind(&self) -> WindowEventKind {
        match self {
            Self::Close => WindowEventKind::Close,
            Self::Focus => WindowEventKind::Focus,
            Self::DragStart => WindowEventKind::DragStart,
            Self::Drag => WindowEventKind::Drag,
            Self::DragEnd => WindowEventKind::DragEnd,
            Self::Minimize => WindowEventKind::Minimize,
            Self::Resize => WindowEventKind::Resize,
            Self::Popup(_) => WindowEventKind::Popup,
            Self::ExportIconConfig(_) => WindowEventKind::ExportIconConfig,
            Self::ChangeTaskbarTitle(_) => WindowEventKind::ChangeTaskbarTitle,
        }
    }
}

/// Remote document fetch in flight for a window.
#[derive(Debug)]
pub(crate) struct PendingRemoteLoad {
    pub generation: u64,
    pub previous_title: String,
    pub previous_content: String,
    pub abort: AbortHandle,
}

#[derive(Debug)]
pub struct Window {
    id: WindowId,
    class_name: String,
    rect: WindowRect,
    title: String,
    content: String,
    icon: Option<String>,
    styles: BTreeMap<String, String>,
    z_index: u32,
    minimized: bool,
    interaction: WindowInteraction,
    saved_state: Value,
    bindings: Vec<EventBinding>,
    emitter: EventEmitter<WindowEvent>,
    outbox: Vec<WindowEvent>,
    pending_load: Option<PendingRemoteLoad>,
    pending_scripts: Vec<ScriptSource>,
}

impl Window {
    /// Builds an idle, visible window from a fully back-filled `config`, fitted to `viewport`.
    pub fn new(
        id: WindowId,
        class_name: impl Into<String>,
        config: &WindowConfig,
        viewport: Viewport,
    ) -> Self {
        let rect = fit_rect(
            WindowRect {
                x: config.x.unwrap_or(0),
                y: config.y.unwrap_or(0),
                w: config.width.unwrap_or(DEFAULT_WINDOW_WIDTH),
                h: config.height.unwrap_or(DEFAULT_WINDOW_HEIGHT),
            },
            viewport,
        );
        Self {
            id,
            class_name: class_name.into(),
            rect,
            title: config.title.clone().unwrap_or_default(),
            content: config.content.clone().unwrap_or_default(),
            icon: config.icon.clone(),
            styles: config.styles.clone().unwrap_or_default(),
            z_index: 0,
            minimized: false,
            interaction: WindowInteraction::Idle,
            saved_state: config.saved_state.clone().unwrap_or(Value::Null),
            bindings: config.events.clone().unwrap_or_default(),
            emitter: EventEmitter::new(),
            outbox: Vec::new(),
            pending_load: None,
            pending_scripts: Vec::new(),
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Style overrides merged over [`default_window_styles`].
    pub fn styles(&self) -> BTreeMap<String, String> {
        let mut styles = default_window_styles();
        styles.extend(self.styles.clone());
        styles
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn interaction(&self) -> WindowInteraction {
        self.interaction
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction != WindowInteraction::Idle
    }

    pub fn saved_state(&self) -> &Value {
        &self.saved_state
    }

    pub fn set_saved_state(&mut self, saved_state: Value) {
        self.saved_state = saved_state;
    }

    pub fn bindings(&self) -> &[EventBinding] {
        &self.bindings
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    /// Subscribes `handler` to `kind`.
    pub fn on(
        &mut self,
        kind: WindowEventKind,
        handler: impl FnMut(&WindowEvent) + 'static,
    ) -> ListenerId {
        self.emitter.on(kind.as_str(), handler)
    }

    pub fn off(&mut self, listener: ListenerId) -> bool {
        self.emitter.off(listener)
    }

    pub fn listener_count(&self, kind: WindowEventKind) -> usize {
        self.emitter.listener_count(kind.as_str())
    }

    fn emit(&mut self, event: WindowEvent) {
        self.emitter.emit(event.kind().as_str(), &event);
        self.outbox.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Starts a drag anchored at `pointer`. Ignored while minimized or already interacting.
    pub fn begin_drag(&mut self, pointer: PointerPosition) -> bool {
        if self.minimized || self.is_interacting() {
            return false;
        }
        self.interaction = WindowInteraction::Dragging(DragSession {
            pointer_start: pointer,
            rect_start: self.rect,
        });
        self.emit(WindowEvent::DragStart);
        true
    }

    pub fn drag_to(&mut self, pointer: PointerPosition, viewport: Viewport) {
        let WindowInteraction::Dragging(session) = self.interaction else {
            return;
        };
        self.rect = drag_rect(
            session.rect_start,
            pointer.x - session.pointer_start.x,
            pointer.y - session.pointer_start.y,
            viewport,
        );
        self.emit(WindowEvent::Drag);
    }

    pub fn end_drag(&mut self) {
        if !matches!(self.interaction, WindowInteraction::Dragging(_)) {
            return;
        }
        self.interaction = WindowInteraction::Idle;
        self.emit(WindowEvent::DragEnd);
    }

    /// Starts a resize from `handle`. Ignored while minimized or already interacting.
    pub fn begin_resize(&mut self, handle: ResizeHandle, pointer: PointerPosition) -> bool {
        if self.minimized || self.is_interacting() {
            return false;
        }
        self.interaction = WindowInteraction::Resizing(ResizeSession {
            handle,
            pointer_start: pointer,
            rect_start: self.rect,
        });
        true
    }

    pub fn resize_to(&mut self, pointer: PointerPosition, viewport: Viewport) {
        let WindowInteraction::Resizing(session) = self.interaction else {
            return;
        };
        self.rect = resize_rect(
            session.rect_start,
            session.handle,
            pointer.x - session.pointer_start.x,
            pointer.y - session.pointer_start.y,
            viewport,
        );
    }

    pub fn end_resize(&mut self) {
        if !matches!(self.interaction, WindowInteraction::Resizing(_)) {
            return;
        }
        self.interaction = WindowInteraction::Idle;
        self.emit(WindowEvent::Resize);
    }

    /// Routes a process-wide pointer move to the active interaction.
    pub fn pointer_move(&mut self, pointer: PointerPosition, viewport: Viewport) {
        match self.interaction {
            WindowInteraction::Dragging(_) => self.drag_to(pointer, viewport),
            WindowInteraction::Resizing(_) => self.resize_to(pointer, viewport),
            WindowInteraction::Idle => {}
        }
    }

    /// Routes a process-wide pointer release to the active interaction.
    pub fn pointer_up(&mut self) {
        match self.interaction {
            WindowInteraction::Dragging(_) => self.end_drag(),
            WindowInteraction::Resizing(_) => self.end_resize(),
            WindowInteraction::Idle => {}
        }
    }

    /// Hides the window. Any interaction in progress is dropped without its end event.
    pub fn minimize(&mut self) {
        self.minimized = true;
        self.interaction = WindowInteraction::Idle;
        self.emit(WindowEvent::Minimize);
    }

    /// Shows the window again. Emits `minimize` like [`Window::minimize`].
    pub fn restore(&mut self) {
        self.minimized = false;
        self.emit(WindowEvent::Minimize);
    }

    pub fn toggle_minimize(&mut self) {
        if self.minimized {
            self.restore();
        } else {
            self.minimize();
        }
    }

    pub(crate) fn set_minimized_silently(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    pub fn set_z_index(&mut self, z_index: u32) {
        self.z_index = z_index;
    }

    /// Re-clamps the position into `viewport`. Size is never changed.
    pub fn fit_to_viewport(&mut self, viewport: Viewport) {
        self.rect = clamp_position(self.rect, viewport);
    }

    pub fn focus(&mut self) {
        self.emit(WindowEvent::Focus);
    }

    pub fn close(&mut self) {
        self.emit(WindowEvent::Close);
    }

    /// Replaces the title and asks the taskbar to follow.
    pub fn set_taskbar_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.title = title.clone();
        self.emit(WindowEvent::ChangeTaskbarTitle(title));
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn request_popup(&mut self, class_name: impl Into<String>, config: WindowConfig) {
        self.emit(WindowEvent::Popup(PopupRequest {
            class_name: class_name.into(),
            config,
        }));
    }

    pub fn export_icon_config(&mut self, icon: DesktopIcon) {
        self.emit(WindowEvent::ExportIconConfig(icon));
    }

    /// Serializable snapshot. While a remote load is pending the pre-load title and content are
    /// reported, so a placeholder never reaches persistence.
    pub fn get_state(&self) -> WindowState {
        let (title, content) = match &self.pending_load {
            Some(pending) => (
                pending.previous_title.clone(),
                pending.previous_content.clone(),
            ),
            None => (self.title.clone(), self.content.clone()),
        };
        WindowState {
            id: self.id.clone(),
            width: self.rect.w,
            height: self.rect.h,
            x: self.rect.x,
            y: self.rect.y,
            z_index: self.z_index,
            is_minimized: self.minimized,
            icon: self.icon.clone(),
            title,
            content,
            styles: self.styles.clone(),
            events: self.bindings.clone(),
            class_name: self.class_name.clone(),
            saved_state: self.saved_state.clone(),
        }
    }

    /// Shows `placeholder` while a fetch runs. A load already in flight is aborted and its
    /// saved title/content carried over.
    pub(crate) fn start_remote_load(
        &mut self,
        generation: u64,
        placeholder: &str,
        abort: AbortHandle,
    ) {
        let (previous_title, previous_content) = match self.pending_load.take() {
            Some(previous) => {
                previous.abort.abort();
                (previous.previous_title, previous.previous_content)
            }
            None => (self.title.clone(), self.content.clone()),
        };
        self.pending_load = Some(PendingRemoteLoad {
            generation,
            previous_title,
            previous_content,
            abort,
        });
        self.title = placeholder.to_string();
        self.content = String::new();
    }

    /// Takes the pending load if it matches `generation`; stale completions get `None`.
    pub(crate) fn finish_remote_load(&mut self, generation: u64) -> Option<PendingRemoteLoad> {
        if self.pending_load.as_ref()?.generation != generation {
            return None;
        }
        self.pending_load.take()
    }

    pub(crate) fn cancel_remote_load(&mut self) {
        if let Some(pending) = self.pending_load.take() {
            pending.abort.abort();
        }
    }

    /// Restores the title and content saved by [`Window::start_remote_load`].
    pub(crate) fn revert_remote_load(&mut self, pending: PendingRemoteLoad) {
        self.title = pending.previous_title;
        self.content = pending.previous_content;
    }

    pub(crate) fn queue_scripts(&mut self, scripts: Vec<ScriptSource>) {
        self.pending_scripts.extend(scripts);
    }

    pub fn has_pending_scripts(&self) -> bool {
        !self.pending_scripts.is_empty()
    }

    /// Scripts from the last remote load that the renderer still has to run.
    pub fn take_pending_scripts(&mut self) -> Vec<ScriptSource> {
        std::mem::take(&mut self.pending_scripts)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(1000, 800)
    }

    fn window_at(x: i32, y: i32) -> Window {
        Window::new(
            WindowId::new("w"),
            "window",
            &WindowConfig::sized(600, 400).at(x, y).with_title("Test"),
            viewport(),
        )
    }

    fn kinds(window: &mut Window) -> Vec<WindowEventKind> {
        window.take_events().iter().map(WindowEvent::kind).collect()
    }

    #[test]
    fn construction_enforces_minimum_size_and_viewport() {
        let window = Window::new(
            WindowId::new("small"),
            "window",
            &WindowConfig::sized(10, 10).at(5000, -40),
            viewport(),
        );
        assert_eq!(
            window.rect(),
            WindowRect {
                x: 800,
                y: 0,
                w: 200,
                h: 100
            }
        );
    }

    #[test]
    fn drag_moves_by_pointer_delta_and_clamps() {
        let mut window = window_at(50, 50);
        assert!(window.begin_drag(PointerPosition::new(100, 100)));
        window.drag_to(PointerPosition::new(50, 80), viewport());
        assert_eq!((window.rect().x, window.rect().y), (0, 30));
        window.end_drag();

        assert_eq!(window.interaction(), WindowInteraction::Idle);
        assert_eq!(
            kinds(&mut window),
            vec![
                WindowEventKind::DragStart,
                WindowEventKind::Drag,
                WindowEventKind::DragEnd
            ]
        );
    }

    #[test]
    fn drag_updates_without_a_session_are_ignored() {
        let mut window = window_at(50, 50);
        window.drag_to(PointerPosition::new(500, 500), viewport());
        window.end_drag();
        window.resize_to(PointerPosition::new(500, 500), viewport());
        window.end_resize();

        assert_eq!(window.rect(), window_at(50, 50).rect());
        assert!(kinds(&mut window).is_empty());
    }

    #[test]
    fn second_begin_is_refused_while_interacting() {
        let mut window = window_at(50, 50);
        assert!(window.begin_drag(PointerPosition::new(0, 0)));
        assert!(!window.begin_resize(ResizeHandle::SouthEast, PointerPosition::new(0, 0)));
        assert!(!window.begin_drag(PointerPosition::new(0, 0)));
    }

    #[test]
    fn resize_emits_only_on_release() {
        let mut window = window_at(50, 50);
        window.begin_resize(ResizeHandle::SouthEast, PointerPosition::new(650, 450));
        window.pointer_move(PointerPosition::new(700, 450), viewport());
        assert!(kinds(&mut window).is_empty());
        window.pointer_up();

        assert_eq!(window.rect().w, 650);
        assert_eq!(kinds(&mut window), vec![WindowEventKind::Resize]);
    }

    #[test]
    fn minimize_toggle_keeps_geometry_and_emits_each_time() {
        let mut window = window_at(120, 80);
        let before = window.rect();

        window.toggle_minimize();
        assert!(window.is_minimized());
        window.toggle_minimize();
        assert!(!window.is_minimized());

        assert_eq!(window.rect(), before);
        assert_eq!(
            kinds(&mut window),
            vec![WindowEventKind::Minimize, WindowEventKind::Minimize]
        );
    }

    #[test]
    fn minimized_window_ignores_drag() {
        let mut window = window_at(120, 80);
        window.minimize();
        assert!(!window.begin_drag(PointerPosition::new(0, 0)));
    }

    #[test]
    fn minimizing_mid_drag_drops_the_session() {
        let mut window = window_at(120, 80);
        window.begin_drag(PointerPosition::new(0, 0));
        window.minimize();
        assert_eq!(window.interaction(), WindowInteraction::Idle);
    }

    #[test]
    fn subscribers_receive_payloads_and_can_unsubscribe() {
        let titles = Rc::new(RefCell::new(Vec::new()));
        let mut window = window_at(0, 0);
        let listener = {
            let titles = titles.clone();
            window.on(WindowEventKind::ChangeTaskbarTitle, move |event| {
                if let WindowEvent::ChangeTaskbarTitle(title) = event {
                    titles.borrow_mut().push(title.clone());
                }
            })
        };

        window.set_taskbar_title("First");
        assert!(window.off(listener));
        window.set_taskbar_title("Second");

        assert_eq!(*titles.borrow(), vec!["First".to_string()]);
        assert_eq!(window.title(), "Second");
    }

    #[test]
    fn fit_to_viewport_moves_but_never_resizes() {
        let mut window = window_at(400, 400);
        window.fit_to_viewport(Viewport::new(700, 500));
        assert_eq!(
            window.rect(),
            WindowRect {
                x: 100,
                y: 100,
                w: 600,
                h: 400
            }
        );
    }

    #[test]
    fn state_reports_pre_load_values_while_loading() {
        let mut window = window_at(0, 0);
        window.set_content("<p>old</p>");
        let (abort, _registration) = AbortHandle::new_pair();

        window.start_remote_load(1, "Loading...", abort);
        assert_eq!(window.title(), "Loading...");
        let state = window.get_state();
        assert_eq!(state.title, "Test");
        assert_eq!(state.content, "<p>old</p>");

        assert!(window.finish_remote_load(2).is_none());
        let pending = window.finish_remote_load(1).expect("matching generation");
        window.revert_remote_load(pending);
        assert_eq!(window.title(), "Test");
        assert!(!window.is_loading());
    }

    #[test]
    fn cancel_aborts_the_pending_fetch() {
        let mut window = window_at(0, 0);
        let (abort, registration) = AbortHandle::new_pair();
        window.start_remote_load(1, "Loading...", abort);

        window.cancel_remote_load();

        let aborted = futures::executor::block_on(futures::future::Abortable::new(
            async { 1 },
            registration,
        ));
        assert!(aborted.is_err());
    }

    #[test]
    fn styles_merge_over_defaults() {
        let mut config = WindowConfig::sized(300, 200);
        config.styles = Some(BTreeMap::from([(
            "background".to_string(),
            "#fff".to_string(),
        )]));
        let window = Window::new(WindowId::new("s"), "window", &config, viewport());

        let styles = window.styles();
        assert_eq!(styles.get("background").map(String::as_str), Some("#fff"));
        assert!(styles.contains_key("font-family"));
        assert_eq!(window.get_state().styles.len(), 1);
    }
}
