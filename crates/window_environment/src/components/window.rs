use super::*;
use crate::{
    model::{ResizeHandle, WindowId},
    window::Window,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

#[cfg(target_arch = "wasm32")]
fn try_set_pointer_capture(ev: &web_sys::PointerEvent) {
    if let Some(target) = ev.current_target() {
        if let Ok(element) = target.dyn_into::<web_sys::Element>() {
            let _ = element.set_pointer_capture(ev.pointer_id());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn try_set_pointer_capture(_: &web_sys::PointerEvent) {}

fn stop_pointer_event(ev: &web_sys::PointerEvent) {
    ev.prevent_default();
    ev.stop_propagation();
}

/// Render-facing copy of a window's visible state.
#[derive(Debug, Clone, PartialEq)]
struct WindowView {
    title: String,
    icon: Option<String>,
    content: String,
    minimized: bool,
    focused: bool,
    loading: bool,
    style: String,
}

impl WindowView {
    fn new(window: &Window, focused: bool) -> Self {
        let rect = window.rect();
        let mut style = format!(
            "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{};",
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            window.z_index()
        );
        for (key, value) in window.styles() {
            style.push_str(&format!("{key}:{value};"));
        }
        Self {
            title: window.title().to_string(),
            icon: window.icon().map(str::to_string),
            content: window.content().to_string(),
            minimized: window.is_minimized(),
            focused,
            loading: window.is_loading(),
            style,
        }
    }
}

#[component]
pub(super) fn DesktopWindow(window_id: WindowId) -> impl IntoView {
    let runtime = use_desktop_runtime();
    let env = runtime.env;
    let content_dom_id = window_id.content_dom_id();
    let id = store_value(window_id);

    let window = create_memo(move |_| {
        id.with_value(|id| {
            env.with(|env| {
                let focused = env.focused_window() == Some(id);
                env.window(id).map(|window| WindowView::new(window, focused))
            })
        })
    });

    let focus = move |_: web_sys::PointerEvent| {
        let already_front = window.get_untracked().map_or(true, |w| w.focused);
        if !already_front {
            env.update(|env| env.focus_window(&id.get_value()));
        }
    };
    let begin_move = move |ev: web_sys::PointerEvent| {
        if !is_primary_press(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        stop_pointer_event(&ev);
        let pointer = pointer_from_pointer_event(&ev);
        env.update(|env| {
            env.begin_drag(&id.get_value(), pointer);
        });
    };
    let begin_resize = move |handle: ResizeHandle, ev: web_sys::PointerEvent| {
        if !is_primary_press(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        stop_pointer_event(&ev);
        let pointer = pointer_from_pointer_event(&ev);
        env.update(|env| {
            env.begin_resize(&id.get_value(), handle, pointer);
        });
    };
    let minimize = move |_| env.update(|env| env.toggle_minimize(&id.get_value()));
    let close = move |_| env.update(|env| env.close_window(&id.get_value()));

    let field =
        move |f: fn(&WindowView) -> String| window.with(|w| w.as_ref().map(f).unwrap_or_default());
    let content = create_memo(move |_| field(|w| w.content.clone()));
    let class = move || {
        field(|w| {
            let focused = if w.focused { " focused" } else { "" };
            let minimized = if w.minimized { " minimized" } else { "" };
            let loading = if w.loading { " loading" } else { "" };
            format!("desktop-window{focused}{minimized}{loading}")
        })
    };

    let frame = view! {
        <section
            class=class
            style=move || field(|w| w.style.clone())
            on:pointerdown=focus
            role="dialog"
            aria-label=move || field(|w| w.title.clone())
        >
            <header class="titlebar" on:pointerdown=begin_move>
                <div class="titlebar-title">
                    <span
                        class=move || {
                            field(|w| format!("icon icon-{}", w.icon.as_deref().unwrap_or("app")))
                        }
                        aria-hidden="true"
                    ></span>
                    <span>{move || field(|w| w.title.clone())}</span>
                </div>
                <div class="titlebar-controls">
                    <button
                        aria-label="Minimize window"
                        on:pointerdown=move |ev: web_sys::PointerEvent| stop_pointer_event(&ev)
                        on:click=minimize
                    >
                        "_"
                    </button>
                    <button
                        aria-label="Close window"
                        on:pointerdown=move |ev: web_sys::PointerEvent| stop_pointer_event(&ev)
                        on:click=close
                    >
                        "x"
                    </button>
                </div>
            </header>
            <div
                id=content_dom_id
                class="window-content"
                inner_html=move || content.get()
            ></div>
            {ResizeHandle::ALL
                .into_iter()
                .map(|handle| {
                    view! {
                        <div
                            class=format!("window-resize-handle handle-{}", handle.as_str())
                            aria-hidden="true"
                            on:pointerdown=move |ev| begin_resize(handle, ev)
                        ></div>
                    }
                })
                .collect_view()}
        </section>
    };

    create_effect(move |_| {
        content.track();
        request_animation_frame(move || {
            let scripts = env
                .try_update_untracked(|env| {
                    let window_id = id.get_value();
                    env.window(&window_id)
                        .is_some_and(Window::has_pending_scripts)
                        .then(|| env.take_pending_scripts(&window_id))
                })
                .flatten();
            if let Some(scripts) = scripts {
                runtime
                    .host
                    .get_value()
                    .run_window_scripts(&id.get_value(), &scripts);
            }
        });
    });

    frame
}
