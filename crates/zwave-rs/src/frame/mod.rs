//! Serial link framing: the frame codec, the inbound stream parser and
//! the SendData completion status.

pub mod codec;
pub mod message;
pub mod receiver;
pub mod transmission;

pub use codec::{DecodedFrame, FrameError, FrameLayout, decode, encode};
pub use message::{Codec, SerialMessage};
pub use receiver::{FrameReceiver, Received};
pub use transmission::TransmissionState;
