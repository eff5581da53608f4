// Interface adapters: wire encoding, transports, storage and host page glue.

pub mod clients;
pub mod clock;
pub mod page;
pub mod protocol;
pub mod storage;

pub use clients::{BeaconTransport, HttpTransport, KeepAliveTransport};
pub use clock::SystemClock;
pub use page::HostPage;
pub use storage::{FileIdentityStore, InMemoryIdentityStore};
