//! Property path codec.
//!
//! [`flatten`] walks a [`Document`](docchain_types::Document) and emits one
//! [`PropertyEntry`](docchain_types::PropertyEntry) per leaf, its path being
//! the keys and `[index.capacity]` elements from the root down, closed by a
//! type tag. [`unflatten`] rebuilds the tree from any permutation of such a
//! list.
//!
//! # Leaf encoding
//!
//! | Type      | Tag       | Value bytes                         |
//! |-----------|-----------|-------------------------------------|
//! | null      | `nil`     | empty                               |
//! | string    | `string`  | raw UTF-8                           |
//! | bool      | `bool`    | ASCII `true` / `false`              |
//! | number    | `float64` | 8-byte big-endian IEEE-754          |

pub mod error;
pub mod flatten;
pub mod json;
pub mod unflatten;
pub mod value;

pub use error::{CodecError, CodecResult};
pub use flatten::flatten;
pub use json::{decode_json, encode_json, flatten_json};
pub use unflatten::unflatten;
pub use value::{decode_value, encode_value};
