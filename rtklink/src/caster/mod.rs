//! NTRIP caster addressing and request/response framing.
//!
//! Shared by the sourcetable client ([`crate::directory`]) and the correction
//! tunnel ([`crate::tunnel`]): both send the same request line and headers and
//! read the same kind of response head before the body starts.

mod request;
mod response;

pub use request::{basic_authorization, build_request, CasterAddress, Credentials};
pub use response::{read_head, ResponseError, ResponseHead, ResponseStatus, MAX_HEAD_SIZE};
