//! Newtype IDs for type-safe document references.
//!
//! Catalog and order documents are keyed by opaque strings assigned by the
//! document store. Use the `define_id!` macro to create type-safe wrappers
//! that prevent accidentally mixing keys from different collections.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use parfum_core::define_id;
/// define_id!(BrandId);
/// define_id!(ReviewId);
///
/// let brand = BrandId::new("dior");
/// let review = ReviewId::new("dior");
///
/// // These are different types, so this won't compile:
/// // let _: BrandId = review;
/// assert_eq!(brand.as_str(), review.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Document keys used across the storefront
define_id!(ProductId);
define_id!(OrderId);
define_id!(UserId);

// A variant key names one purchasable form of a product ("bottle",
// "decant5ml", ...). It is not globally unique on its own; only the pair
// (ProductId, VariantKey) identifies a cart line.
define_id!(VariantKey);

impl VariantKey {
    /// Full bottle variant.
    pub const BOTTLE: &'static str = "bottle";
    /// 5ml decant variant.
    pub const DECANT_5ML: &'static str = "decant5ml";
    /// 10ml decant variant.
    pub const DECANT_10ML: &'static str = "decant10ml";

    /// Whether this key names a decant rather than a full bottle.
    #[must_use]
    pub fn is_decant(&self) -> bool {
        self.0.starts_with("decant")
    }
}
