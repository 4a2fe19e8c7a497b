pub mod constraints;
pub mod errors;
pub mod types;

pub use constraints::{
    AudioConstraints, IceConfig, MediaConstraints, OpusParams, VideoConstraints, Vp8Params,
};
pub use errors::{AirCastError, PeerError, SignalingError};
pub use types::*;
