#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Vertaalt een McStas-achtige instrumentbeschrijving naar een NeXus-achtige
//! doelboom: componentposities worden transformatieketens, parameters worden
//! velden of uitgestelde koppelingen naar runtime-parameters.

pub mod components;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod geom;
pub mod graph;
pub mod instrument;
pub mod orientation;
pub mod parse;

use std::fmt;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use diagnostics::Diagnostics;
use instrument::{Export, ExportOptions, Instrument};

pub use error::{ExportError, StructuralError};
pub use instrument::export;
pub use parse::load_instrument;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize)]
struct ComponentInfo {
    name: String,
    #[serde(rename = "type")]
    component_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depends_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain: Option<String>,
}

#[derive(Debug, Serialize)]
struct ComponentInfoResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    components: Vec<ComponentInfo>,
}

/// Publiek toegangspunt voor consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    instrument: Option<Instrument>,
    options: ExportOptions,
    last_export: Option<Export>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            instrument: None,
            options: ExportOptions::default(),
            last_export: None,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad een instrumentbeschrijving (JSON) in de engine.
    #[wasm_bindgen]
    pub fn load_instrument(&mut self, json: &str) -> Result<(), JsValue> {
        let instrument = parse::load_instrument(json).map_err(to_js_error)?;
        debug_log!(
            "instrument `{}` geladen met {} componenten",
            instrument.name,
            instrument.components.len()
        );
        self.instrument = Some(instrument);
        self.last_export = None;
        Ok(())
    }

    /// Zet exportopties (JSON); ontbrekende sleutels houden hun standaard.
    #[wasm_bindgen]
    pub fn set_options(&mut self, json: &str) -> Result<(), JsValue> {
        self.options = serde_json::from_str(json).map_err(to_js_error)?;
        self.last_export = None;
        Ok(())
    }

    /// Exporteer het geladen instrument en geef de doelboom terug.
    #[wasm_bindgen]
    pub fn export(&mut self) -> Result<JsValue, JsValue> {
        let export = self.run_export()?;
        serde_wasm_bindgen::to_value(&export.tree).map_err(to_js_error)
    }

    /// Als [`Engine::export`], maar als JSON-tekst.
    #[wasm_bindgen]
    pub fn export_json(&mut self) -> Result<String, JsValue> {
        let export = self.run_export()?;
        export.to_json().map_err(to_js_error)
    }

    /// Meldingen van de laatste export.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let empty = Diagnostics::new();
        let diagnostics = self.last_export.as_ref().map_or(&empty, |export| &export.diagnostics);
        serde_wasm_bindgen::to_value(diagnostics).map_err(to_js_error)
    }

    /// Overzicht van de componenten en hun plaatsing in de laatste export.
    #[wasm_bindgen]
    pub fn get_component_info(&self) -> Result<JsValue, JsValue> {
        let response = self.component_info()?;
        serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
    }
}

impl Engine {
    fn run_export(&mut self) -> Result<&Export, JsValue> {
        let Some(loaded) = self.instrument.as_ref() else {
            return Err(js_error("er is nog geen instrument geladen"));
        };
        let export = export(loaded, &self.options).map_err(to_js_error)?;
        debug_log!(
            "export klaar: {} componenten, {} meldingen",
            export.placements.len(),
            export.diagnostics.len()
        );
        Ok(self.last_export.insert(export))
    }

    fn component_info(&self) -> Result<ComponentInfoResponse, JsValue> {
        let Some(instrument) = self.instrument.as_ref() else {
            return Err(js_error("er is nog geen instrument geladen"));
        };
        let export = self.last_export.as_ref();
        let components = instrument
            .components
            .iter()
            .map(|component| {
                let placement = export.and_then(|export| export.placement(&component.name));
                ComponentInfo {
                    name: component.name.clone(),
                    component_type: component.component_type.name.clone(),
                    category: component.component_type.category.clone(),
                    depends_on: placement
                        .and_then(|placement| placement.outer.as_ref())
                        .map(|outer| format!("{}/{outer}", components::TRANSFORMATIONS)),
                    chain: placement
                        .and_then(|placement| placement.chain.as_ref())
                        .map(ToString::to_string),
                }
            })
            .collect();
        Ok(ComponentInfoResponse {
            reference: export.and_then(|export| export.reference.clone()),
            components,
        })
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;

    const INSTRUMENT: &str = r#"{
        "name": "mini",
        "components": [
            {"name": "origin", "type": "Arm"},
            {"name": "sample", "type": "Incoherent", "category": "samples",
             "at": {"vector": [0, 0, 2], "relative": "origin"}}
        ]
    }"#;

    #[test]
    fn export_requires_an_instrument() {
        let mut engine = Engine::new();
        assert!(engine.is_initialized());
        assert!(engine.export_json().is_err());
    }

    #[test]
    fn exports_loaded_instrument_as_json() {
        let mut engine = Engine::new();
        engine.load_instrument(INSTRUMENT).unwrap();
        engine.set_options(r#"{"provenance": false}"#).unwrap();
        let json = engine.export_json().unwrap();
        let tree: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(tree["NX_class"], "NXinstrument");
        assert_eq!(tree["children"]["name"]["value"], "mini");
        assert_eq!(
            tree["children"]["origin"]["attributes"]["depends_on"],
            "transformations/origin_0"
        );

        let info = engine.component_info().unwrap();
        assert_eq!(info.reference.as_deref(), Some("sample"));
        assert_eq!(info.components.len(), 2);
        assert!(info.components[1].depends_on.is_none());
    }

    #[test]
    fn rejects_malformed_options() {
        let mut engine = Engine::new();
        assert!(engine.set_options(r#"{"structural_policy": "maybe"}"#).is_err());
    }
}
