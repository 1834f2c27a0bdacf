// ── Domain model ──
//
// Identity types, collection items, asynchronous operations, and the typed
// resource families built on top of them.

pub mod activation;
pub mod asmap;
pub mod desired;
pub mod hostname;
pub mod item;
pub mod key;
pub mod operation;

pub use activation::{ActivationRequest, Network};
pub use asmap::{AsAssignment, AsMapSpec, DefaultDatacenter, MAP_DEFAULT_DATACENTER_ID};
pub use desired::DesiredState;
pub use hostname::{EdgeHostname, IpBehavior, SecureNetwork};
pub use item::{CollectionScope, RemoteItem};
pub use key::{BusinessKey, KeyPart, Keyed, SurrogateId};
pub use operation::{
    ConvergenceOperation, OperationHandle, OperationKind, Phase, Status, StatusReport, Submission,
    TerminalStatuses,
};
