//! Newtype IDs for type-safe entity references.
//!
//! Every entity table uses a `SERIAL` primary key, so all IDs wrap an `i32`.
//! The `define_id!` macro keeps an `OrderId` from being passed where a
//! `ProductId` is expected while still letting generic code treat any ID as
//! a [`RecordId`].

use core::fmt;
use core::hash::Hash;

/// Common behaviour of every entity ID.
///
/// Generic stores only need to move IDs in and out of the storage layer, which
/// always speaks `i32`.
pub trait RecordId:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + Unpin + 'static
{
    /// Wrap a raw storage value.
    fn from_raw(raw: i32) -> Self;

    /// The raw storage value.
    fn raw(self) -> i32;
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - A [`RecordId`] implementation
///
/// # Example
///
/// ```rust
/// # use ecommerce_core::define_id;
/// define_id!(WishlistId);
///
/// let id = WishlistId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "7");
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
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
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

        impl $crate::types::id::RecordId for $name {
            fn from_raw(raw: i32) -> Self {
                Self(raw)
            }

            fn raw(self) -> i32 {
                self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(RoleId);
define_id!(UserRoleId);
define_id!(CategoryId);
define_id!(MerchantId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(ProductId);
define_id!(TransactionId);
define_id!(CartId);
define_id!(ReviewId);
define_id!(ShippingAddressId);
define_id!(SliderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip_raw_values() {
        let id = ProductId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(ProductId::from(42), id);
    }

    #[test]
    fn test_ids_order_by_raw_value() {
        let mut ids = vec![OrderId::new(3), OrderId::new(1), OrderId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&CartId::new(9)).unwrap();
        assert_eq!(json, "9");

        let parsed: CartId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, CartId::new(9));
    }
}
