//! Postchain GTV (generic transaction value) model and codec.
//!
//! [`Gtv`] is the tagged value every GTX transaction is built from. Values
//! encode to a DER-style TLV form (see [`codec`]) whose bytes are unique per
//! value, so the same encoding is hashed for signing and sent on the wire.
//!
//! ```
//! use postchain_gtv::Gtv;
//!
//! let op = Gtv::list(vec![Gtv::from("transfer"), Gtv::list([1000])]);
//! let bytes = op.encode();
//! assert_eq!(Gtv::decode(&bytes).unwrap(), op);
//! ```

pub mod codec;
pub mod der;
pub mod error;
pub mod value;

pub use codec::{decode, encode};
pub use der::{decode_length, encode_length};
pub use error::GtvError;
pub use value::Gtv;
