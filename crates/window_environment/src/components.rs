//! Desktop shell UI composition and interaction surfaces.

mod taskbar;
mod window;

use std::time::Duration;

use leptos::*;
use platform_host::unix_time_ms_now;

use self::{taskbar::Taskbar, window::DesktopWindow};

pub use crate::runtime_context::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext};
use crate::model::{DesktopIcon, PointerPosition};

/// Height of the taskbar strip; the desktop viewport excludes it.
pub const TASKBAR_HEIGHT_PX: i32 = 30;

fn pointer_from_pointer_event(ev: &web_sys::PointerEvent) -> PointerPosition {
    PointerPosition {
        x: ev.client_x(),
        y: ev.client_y(),
    }
}

fn is_primary_press(ev: &web_sys::PointerEvent) -> bool {
    if ev.pointer_type() == "mouse" {
        ev.button() == 0
    } else {
        ev.is_primary()
    }
}

#[component]
/// Renders the desktop: icons, windows back-to-front, and the taskbar. Routes process-wide
/// pointer moves and releases to the window that owns the pointer.
pub fn DesktopShell() -> impl IntoView {
    let runtime = use_desktop_runtime();
    let env = runtime.env;

    let move_listener = window_event_listener(ev::pointermove, move |ev| {
        if env.with_untracked(|env| env.interaction_owner().is_none()) {
            return;
        }
        let pointer = pointer_from_pointer_event(&ev);
        env.update(|env| env.pointer_move(pointer));
    });
    let up_listener = window_event_listener(ev::pointerup, move |_| {
        if env.with_untracked(|env| env.interaction_owner().is_some()) {
            env.update(|env| env.pointer_up());
        }
    });
    let cancel_listener = window_event_listener(ev::pointercancel, move |_| {
        if env.with_untracked(|env| env.interaction_owner().is_some()) {
            env.update(|env| env.pointer_up());
        }
    });
    let resize_listener = window_event_listener(ev::resize, move |_| {
        let viewport = runtime.host.get_value().desktop_viewport(TASKBAR_HEIGHT_PX);
        env.update(|env| env.set_viewport(viewport));
    });
    on_cleanup(move || {
        move_listener.remove();
        up_listener.remove();
        cancel_listener.remove();
        resize_listener.remove();
    });

    let flush_interval =
        Duration::from_millis(env.with_untracked(|env| env.config().persist_interval_ms).max(16));
    if let Ok(interval) = set_interval_with_handle(
        move || {
            env.update_untracked(|env| {
                env.flush_persistence(unix_time_ms_now());
            });
        },
        flush_interval,
    ) {
        on_cleanup(move || interval.clear());
    }

    view! {
        <div
            id="desktop-shell-root"
            class="desktop-shell"
            data-theme=move || env.with(|env| env.session().theme.clone())
        >
            <div
                class="desktop-area"
                style=format!("bottom:{TASKBAR_HEIGHT_PX}px;")
            >
                <DesktopIcons />
                <div class="desktop-window-layer">
                    <For
                        each=move || env.with(|env| env.window_ids())
                        key=|id| id.clone()
                        let:id
                    >
                        <DesktopWindow window_id=id />
                    </For>
                </div>
            </div>
            <Taskbar />
        </div>
    }
}

#[component]
fn DesktopIcons() -> impl IntoView {
    let runtime = use_desktop_runtime();
    let icons = move || {
        runtime
            .env
            .with(|env| env.icons().cloned().collect::<Vec<DesktopIcon>>())
    };

    view! {
        <ul class="desktop-icons" role="list">
            <For each=icons key=|icon| icon.id.clone() let:icon>
                {{
                    let icon_id = icon.id.clone();
                    let glyph = icon.icon.clone().unwrap_or_else(|| "app".to_string());
                    view! {
                        <li>
                            <button
                                class="desktop-icon"
                                title=icon.label.clone()
                                on:dblclick=move |_| runtime.launch_icon(&icon_id)
                            >
                                <span class=format!("icon icon-{glyph}") aria-hidden="true"></span>
                                <span class="desktop-icon-label">{icon.label.clone()}</span>
                            </button>
                        </li>
                    }
                }}
            </For>
        </ul>
    }
}
