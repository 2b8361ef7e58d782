//! Crate-wide error type.
//!
//! Each component raises its own typed error (see `criteria_lexer::LexError`,
//! `schema::UnknownKeyError`, `value_transformers::TransformError`,
//! `smart_collection::SmartError`, `geocoder::GeoError`,
//! `catalog::CatalogError`, `lua_decode::DecodeError`); this enum unifies
//! them for the public compiler API.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::criteria_lexer::LexError;
use crate::geocoder::GeoError;
use crate::lua_decode::DecodeError;
use crate::schema::UnknownKeyError;
use crate::smart_collection::SmartError;
use crate::value_transformers::TransformError;

/// Every error kind the compiler pipeline can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] LexError),

    #[error(transparent)]
    UnknownKey(#[from] UnknownKeyError),

    #[error(transparent)]
    BadValue(#[from] TransformError),

    #[error(transparent)]
    UnsupportedOperation(#[from] SmartError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
