//! Browser glue
//!
//! Thin wrappers over the DOM calls the game makes: the ball counter text,
//! modal alerts, LocalStorage. Everything is a no-op off the web.

#[cfg(target_arch = "wasm32")]
pub fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

#[cfg(target_arch = "wasm32")]
pub fn local_storage() -> Option<web_sys::Storage> {
    window()?.local_storage().ok().flatten()
}

/// Replace the text of the element with `id`
#[cfg(target_arch = "wasm32")]
pub fn set_text(id: &str, text: &str) {
    match window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
    {
        Some(el) => el.set_text_content(Some(text)),
        None => log::warn!("No #{id} element"),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn alert(message: &str) {
    if let Some(window) = window() {
        if window.alert_with_message(message).is_err() {
            log::warn!("alert() failed: {message}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn device_pixel_ratio() -> f64 {
    window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn set_text(id: &str, text: &str) {
    log::info!("#{id}: {text}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn alert(message: &str) {
    log::info!("alert: {message}");
}

#[cfg(not(target_arch = "wasm32"))]
pub fn device_pixel_ratio() -> f64 {
    1.0
}
