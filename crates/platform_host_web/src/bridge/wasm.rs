use super::*;
use js_sys::Promise;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = r#"
export async function jsFetchText(url) {
  const response = await fetch(url, { credentials: 'omit' });
  const body = await response.text();
  return { url: response.url || url, status: response.status, body };
}

export function jsRunScripts(containerId, scripts) {
  const container = document.getElementById(containerId);
  if (!container) {
    throw new Error(`window content container #${containerId} not found`);
  }
  for (const script of scripts) {
    const element = document.createElement('script');
    if (typeof script.External === 'string') {
      element.src = script.External;
      element.async = false;
    } else if (typeof script.Inline === 'string') {
      element.textContent = script.Inline;
    } else {
      continue;
    }
    container.appendChild(element);
  }
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsFetchText)]
    fn js_fetch_text(url: &str) -> Promise;
    #[wasm_bindgen(js_name = jsRunScripts, catch)]
    fn js_run_scripts(container_id: &str, scripts: JsValue) -> Result<(), JsValue>;
}

fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

pub async fn fetch_text(url: &str) -> Result<FetchedDocument, String> {
    let value = JsFuture::from(js_fetch_text(url))
        .await
        .map_err(js_error_to_string)?;
    from_value(value).map_err(|e| e.to_string())
}

pub fn run_scripts(container_id: &str, scripts: &[ScriptSource]) -> Result<(), String> {
    if scripts.is_empty() {
        return Ok(());
    }
    let value = to_value(scripts).map_err(|e| e.to_string())?;
    js_run_scripts(container_id, value).map_err(js_error_to_string)
}
