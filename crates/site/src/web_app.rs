use leptos::*;
use leptos_meta::*;
use window_environment::{DesktopProvider, DesktopShell};

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Webtop" />
        <Meta name="description" content="A desktop of draggable windows in the browser." />
        <Meta name="host-strategy" content=platform_host_web::host_strategy_name() />

        <main class="site-root">
            <DesktopEntry />
        </main>
    }
}

#[component]
pub fn DesktopEntry() -> impl IntoView {
    view! {
        <DesktopProvider>
            <DesktopShell />
        </DesktopProvider>
    }
}
