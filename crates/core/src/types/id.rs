//! Typed row identifiers.
//!
//! Every table in the storefront is keyed by a `SERIAL` column. Wrapping the
//! raw `i32` keeps a cart item id from being passed where a product id is
//! expected.

/// Errors produced when an identifier arrives from untrusted input.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// The input is not an integer in the `i32` range.
    #[error("identifier must be a whole number")]
    NotANumber,
    /// The input is zero or negative.
    #[error("identifier must be a positive number")]
    NotPositive,
}

/// Define a typed identifier backed by a positive `i32`.
///
/// The generated type is `#[serde(transparent)]`, convertible to and from
/// `i32`, and (with the `postgres` feature) binds directly in sqlx queries.
///
/// ```rust
/// # use dessert_shop_core::define_id;
/// define_id!(InvoiceId);
///
/// let id = InvoiceId::parse("17").unwrap();
/// assert_eq!(id.as_i32(), 17);
/// assert!(InvoiceId::parse("0").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw value read from storage.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Accept a caller-supplied integer, rejecting zero, negatives and
            /// anything outside the `i32` range.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::NotANumber`](crate::IdError) when the value does not fit
            /// and [`IdError::NotPositive`](crate::IdError) when it is below one.
            pub fn from_untrusted(raw: i64) -> ::core::result::Result<Self, $crate::IdError> {
                let id = i32::try_from(raw).map_err(|_| $crate::IdError::NotANumber)?;
                if id < 1 {
                    return Err($crate::IdError::NotPositive);
                }
                Ok(Self(id))
            }

            /// Parse a path segment or form value.
            ///
            /// # Errors
            ///
            /// See [`Self::from_untrusted`].
            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let value = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| $crate::IdError::NotANumber)?;
                Self::from_untrusted(value)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(ProductImageId);
define_id!(CartItemId);
