//! Vibration via `navigator.vibrate`
//!
//! Browsers without the Vibration API, and native builds, silently do nothing.

/// Play a pulse pattern (alternating on/off milliseconds)
#[cfg(target_arch = "wasm32")]
pub fn vibrate(pattern: &[u32]) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let navigator = window.navigator();

    // Feature-detect; calling a missing method would throw
    let has_vibrate = js_sys::Reflect::has(&navigator, &"vibrate".into()).unwrap_or(false);
    if !has_vibrate {
        return;
    }

    match pattern {
        [] => {}
        [single] => {
            navigator.vibrate_with_duration(*single);
        }
        _ => {
            let array: js_sys::Array = pattern
                .iter()
                .map(|&ms| wasm_bindgen::JsValue::from(ms))
                .collect();
            navigator.vibrate_with_pattern(&array);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn vibrate(pattern: &[u32]) {
    log::trace!("vibrate {:?} (no-op on native)", pattern);
}
