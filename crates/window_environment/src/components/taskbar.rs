use platform_host::clock_label_now;

use super::*;
use crate::model::TaskbarPin;

#[component]
pub(super) fn Taskbar() -> impl IntoView {
    let runtime = use_desktop_runtime();
    let env = runtime.env;
    let clock = create_rw_signal(clock_label_now());

    if let Ok(interval) = set_interval_with_handle(
        move || clock.set(clock_label_now()),
        Duration::from_secs(1),
    ) {
        on_cleanup(move || interval.clear());
    }

    let pins = move || env.with(|env| env.pins().to_vec());
    let focused = move || env.with(|env| env.focused_window().cloned());

    view! {
        <footer
            class="taskbar"
            role="toolbar"
            aria-label="Taskbar"
            style=format!("height:{TASKBAR_HEIGHT_PX}px;")
        >
            <div class="taskbar-session">
                <span class="taskbar-username">
                    {move || env.with(|env| env.session().username.clone())}
                </span>
            </div>
            <div class="taskbar-pins">
                <For each=pins key=|pin| (pin.window_id.clone(), pin.title.clone()) let:pin>
                    {{
                        let TaskbarPin { window_id, title, icon } = pin;
                        let glyph = icon.unwrap_or_else(|| "app".to_string());
                        let id = store_value(window_id);
                        let state_class = move || {
                            let window_id = id.get_value();
                            let minimized = env.with(|env| {
                                env.window(&window_id).is_some_and(|w| w.is_minimized())
                            });
                            if minimized {
                                "taskbar-pin minimized"
                            } else if focused().as_ref() == Some(&window_id) {
                                "taskbar-pin active"
                            } else {
                                "taskbar-pin"
                            }
                        };
                        view! {
                            <button
                                class=state_class
                                title=title.clone()
                                on:click=move |_| env.update(|env| env.activate_pin(&id.get_value()))
                            >
                                <span class=format!("icon icon-{glyph}") aria-hidden="true"></span>
                                <span class="taskbar-pin-title">{title}</span>
                            </button>
                        }
                    }}
                </For>
            </div>
            <time class="taskbar-clock">{move || clock.get()}</time>
        </footer>
    }
}
