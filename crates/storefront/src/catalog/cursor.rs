//! Opaque continuation cursors.
//!
//! A cursor names the last item of a fetched page by its value in the
//! ordering field plus its product id, which breaks ties between items that
//! share a value. The wire form is URL-safe base64 over a small JSON body,
//! so callers can carry it in a URL without caring what is inside.

use std::cmp;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parfum_core::ProductId;

use super::query::Field;
use super::{CatalogError, CatalogItem};

/// Value of one catalog field, as used for ordering and cursors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum SortValue {
    Text(String),
    Decimal(Decimal),
    Time(DateTime<Utc>),
    Count(u64),
}

impl SortValue {
    /// The value `item` holds in `field`.
    #[must_use]
    pub fn of(item: &CatalogItem, field: Field) -> Self {
        match field {
            Field::Name => Self::Text(item.name.clone()),
            Field::Brand => Self::Text(item.brand.clone()),
            Field::Category => Self::Text(item.category.clone()),
            Field::SearchKeywords => Self::Text(item.search_keywords.join(" ")),
            Field::Price => Self::Decimal(item.price),
            Field::Rating => Self::Decimal(item.rating),
            Field::CreatedAt => Self::Time(item.created_at),
            Field::SoldCount => Self::Count(item.sold_count),
            Field::Featured => Self::Count(u64::from(item.featured)),
            Field::HasDecant => Self::Count(u64::from(item.has_decant)),
            Field::HasFullBottle => Self::Count(u64::from(item.has_full_bottle)),
        }
    }

    /// Compare two values of the same kind. Values of different kinds do
    /// not compare.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<cmp::Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Count(a), Self::Count(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Decoded cursor body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorKey {
    pub value: SortValue,
    pub id: ProductId,
}

/// Opaque continuation token; `None` in its place means "from the start".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Encode a cursor key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be serialized.
    pub fn encode(key: &CursorKey) -> Result<Self, CatalogError> {
        let body = serde_json::to_vec(key)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(body)))
    }

    /// Cursor pointing at `item` under an ordering on `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be serialized.
    pub fn for_item(item: &CatalogItem, field: Field) -> Result<Self, CatalogError> {
        Self::encode(&CursorKey {
            value: SortValue::of(item, field),
            id: item.id.clone(),
        })
    }

    /// Decode the cursor body.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidCursor` if the token was not produced
    /// by [`PageCursor::encode`].
    pub fn decode(&self) -> Result<CursorKey, CatalogError> {
        let body = URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|e| CatalogError::InvalidCursor(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::InvalidCursor(e.to_string()))
    }

    /// Wrap a token received from elsewhere (e.g. a URL parameter).
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
