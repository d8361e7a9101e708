//! Invoer: instrumentbeschrijvingen en hulpfragmenten uit JSON.

pub mod fragments;
pub mod instrument_json;

pub use fragments::{Fragment, FragmentError, Fragments, fragments_from_json, is_valid_name};
pub use instrument_json::{LoadError, LoadResult, instrument_from_value, load_instrument};
