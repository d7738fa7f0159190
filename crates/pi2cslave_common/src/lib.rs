pub mod cancel;
pub mod producer;

pub use cancel::{CancelToken, Cancelled};
pub use producer::{ByteProducer, SliceProducer};

/// Rolling address handed to a [`ByteProducer`] for every byte pulled.
pub type Addr = u16;
