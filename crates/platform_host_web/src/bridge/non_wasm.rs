use super::*;

fn unsupported() -> String {
    "Browser fetch/DOM APIs are only available when compiled for wasm32".to_string()
}

pub async fn fetch_text(_url: &str) -> Result<FetchedDocument, String> {
    Err(unsupported())
}

pub fn run_scripts(_container_id: &str, scripts: &[ScriptSource]) -> Result<(), String> {
    if scripts.is_empty() {
        Ok(())
    } else {
        Err(unsupported())
    }
}
