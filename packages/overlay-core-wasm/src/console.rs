#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// In the browser, logs go straight to console.log
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    // Use `js_namespace` to bind `console.log(..)` instead of just `log(..)`
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

// Native builds (CLI, tests) route the same messages into tracing
#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    tracing::info!(target: "overlay_core_wasm", "{}", s);
}

// Note: The console_log macro is defined in lib.rs to avoid duplication
