//! Plot descriptors and the lazy loader that materializes charts.
//!
//! Plot slots are elements carrying a descriptor URL in their
//! [`PLOT_SRC_ATTR`] attribute. Loading is fire-and-forget per slot: each
//! task owns its element handle, so a panel hidden mid-flight still resolves
//! harmlessly off-screen. Failures are logged to the console and the slot is
//! left inert; nothing escapes the loader.

use serde::Deserialize;
use serde_json::Value;

/// Attribute naming the descriptor URL on a plot slot.
pub const PLOT_SRC_ATTR: &str = "data-plotly-src";

/// Chart description fetched from the server: plotly trace list, layout,
/// and an optional set of FontFace descriptors to pre-load so the chart
/// does not re-layout when fonts arrive late.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotDescriptor {
    pub data: Vec<Value>,
    pub layout: Value,
    #[serde(default)]
    pub fonts: Vec<FontSpec>,
}

/// FontFace schema subset; `family` is the only field the pre-loader needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
}

pub fn parse_descriptor(body: &str) -> Result<PlotDescriptor, String> {
    serde_json::from_str(body).map_err(|err| format!("invalid plot descriptor: {err}"))
}

/// Kick off a load for every plot slot below `container_id`. Slots already
/// processed no longer carry the attribute and are skipped, so re-applying
/// a tab selection is idempotent.
#[cfg(target_arch = "wasm32")]
pub fn load_descendant_plots(container_id: &str) {
    use wasm_bindgen::JsCast;

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(container) = document.get_element_by_id(container_id) else {
        return;
    };
    let Ok(slots) = container.query_selector_all(&format!("[{PLOT_SRC_ATTR}]")) else {
        return;
    };
    for index in 0..slots.length() {
        let Some(node) = slots.get(index) else {
            continue;
        };
        let Ok(element) = node.dyn_into::<web_sys::Element>() else {
            continue;
        };
        crate::core::platform::spawn_future(async move {
            load_plot(element).await;
        });
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_descendant_plots(_container_id: &str) {}

/// Fetch one slot's descriptor and render it in place. The attribute is
/// cleared up front so the load happens at most once; on failure the slot
/// keeps its fallback content.
#[cfg(target_arch = "wasm32")]
pub async fn load_plot(element: web_sys::Element) {
    use dioxus::logger::tracing::warn;

    let Some(url) = element.get_attribute(PLOT_SRC_ATTR) else {
        return;
    };
    let _ = element.remove_attribute(PLOT_SRC_ATTR);

    match fetch_descriptor(&url).await {
        Ok(descriptor) => {
            preload_fonts(&descriptor.fonts).await;
            if let Err(err) = render_chart(&element, &descriptor) {
                warn!("plot {url}: render failed: {err:?}");
            }
        }
        Err(err) => warn!("plot {url}: {err}"),
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_descriptor(url: &str) -> Result<PlotDescriptor, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("window unavailable")?;

    let init = web_sys::RequestInit::new();
    init.set_method("GET");
    let request = web_sys::Request::new_with_str_and_init(url, &init)
        .map_err(|_| "request construction failed".to_string())?;
    request
        .headers()
        .set("Accept", "application/json")
        .map_err(|_| "request headers rejected".to_string())?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| "fetch failed".to_string())?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| "fetch returned a non-response".to_string())?;
    if response.status() >= 300 {
        return Err(format!("HTTP {}", response.status()));
    }

    let body = JsFuture::from(
        response
            .text()
            .map_err(|_| "response body unavailable".to_string())?,
    )
    .await
    .map_err(|_| "response body read failed".to_string())?;

    parse_descriptor(&body.as_string().unwrap_or_default())
}

/// Ask the browser to load each named family before the chart is built.
/// Skipped when the runtime has no FontFaceSet; a family that fails to load
/// is not an error, the chart just renders with fallbacks.
#[cfg(target_arch = "wasm32")]
async fn preload_fonts(fonts: &[FontSpec]) {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    if fonts.is_empty() {
        return;
    }
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let font_set = match js_sys::Reflect::get(document.as_ref(), &JsValue::from_str("fonts")) {
        Ok(value) if !value.is_undefined() && !value.is_null() => value,
        _ => return,
    };
    let Ok(load) = js_sys::Reflect::get(&font_set, &JsValue::from_str("load")) else {
        return;
    };
    let Ok(load) = load.dyn_into::<js_sys::Function>() else {
        return;
    };

    for font in fonts {
        let spec = format!("1em {}", font.family);
        if let Ok(result) = load.call1(&font_set, &JsValue::from_str(&spec)) {
            if let Ok(promise) = result.dyn_into::<js_sys::Promise>() {
                let _ = JsFuture::from(promise).await;
            }
        }
    }
}

// plotly.js is loaded by the page; the chart library stays external.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Plotly, js_name = newPlot, catch)]
    fn plotly_new_plot(
        target: &web_sys::Element,
        data: &wasm_bindgen::JsValue,
        layout: &wasm_bindgen::JsValue,
    ) -> Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>;
}

#[cfg(target_arch = "wasm32")]
fn render_chart(
    element: &web_sys::Element,
    descriptor: &PlotDescriptor,
) -> Result<(), wasm_bindgen::JsValue> {
    let data = serde_json::to_string(&descriptor.data)
        .map_err(|err| wasm_bindgen::JsValue::from_str(&err.to_string()))?;
    let layout = serde_json::to_string(&descriptor.layout)
        .map_err(|err| wasm_bindgen::JsValue::from_str(&err.to_string()))?;
    let data = js_sys::JSON::parse(&data)?;
    let layout = js_sys::JSON::parse(&layout)?;
    plotly_new_plot(element, &data, &layout)?;
    Ok(())
}
