//! A single operation call inside a transaction.

use crate::TxError;
use postchain_gtv::Gtv;

/// An operation name and its arguments, replayed by the node in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub args: Vec<Gtv>,
}

impl Operation {
    /// Build an operation call.
    pub fn new(name: impl Into<String>, args: Vec<Gtv>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Encoded as `[name, [args...]]`.
    pub fn to_gtv(&self) -> Gtv {
        Gtv::List(vec![
            Gtv::Text(self.name.clone()),
            Gtv::List(self.args.clone()),
        ])
    }

    /// Parse `[name, [args...]]`.
    pub fn from_gtv(value: &Gtv) -> Result<Self, TxError> {
        match value.as_list() {
            Some([Gtv::Text(name), Gtv::List(args)]) => Ok(Self::new(name.clone(), args.clone())),
            _ => Err(TxError::Malformed(format!(
                "operation must be [name, [args]], got {}",
                value
            ))),
        }
    }
}
