pub mod bridge;
pub mod dispatch;
pub mod handle;
pub mod messages;

pub use bridge::WorkerBridge;
pub use dispatch::HostDispatcher;
pub use handle::WorkerHandle;
pub use messages::{BridgeRequest, BridgeResponse, WorkerEvent};
