mod nexia_api;

pub use nexia_api::*;
