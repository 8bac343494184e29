//! Time helpers shared across host contracts and adapters.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Formats the wall clock as `HH:MM` for the taskbar.
///
/// Browsers report local time; native builds fall back to UTC.
pub fn clock_label_now() -> String {
    #[cfg(target_arch = "wasm32")]
    {
        let date = js_sys::Date::new_0();
        format!("{:02}:{:02}", date.get_hours(), date.get_minutes())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        utc_clock_label(unix_time_ms_now())
    }
}

/// Formats a unix millisecond timestamp as a UTC `HH:MM` label.
pub fn utc_clock_label(unix_ms: u64) -> String {
    let minutes_of_day = (unix_ms / 60_000) % (24 * 60);
    format!("{:02}:{:02}", minutes_of_day / 60, minutes_of_day % 60)
}
