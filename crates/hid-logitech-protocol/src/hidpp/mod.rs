//! HID++ 2.0 dialect: framing, session state, negotiation, feature lookup and
//! the force feedback effect lifecycle.

pub mod effects;
pub mod features;
pub mod frame;
pub mod negotiate;
pub mod session;

pub use effects::{DownloadParams, ForceFeedback, decode_download_params};
pub use features::{FeatureInfo, resolve_feature, resolve_force_feedback};
pub use frame::{ErrorReply, Framing, HidppMessage, build_request};
pub use negotiate::{Negotiated, PingAttempt, negotiate, ping_attempts};
pub use session::{ProtocolVersion, SessionContext, SlotTable};
