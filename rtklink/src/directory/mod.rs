//! Correction directory: sourcetable parsing and mountpoint ranking.
//!
//! A caster advertises its mountpoints in a plain-text sourcetable, one
//! semicolon-delimited record per line. Only `STR` records describe
//! mountpoints; they are parsed into [`MountpointRecord`] values and can be
//! ranked by great-circle distance to the rover.
//!
//! # Example
//!
//! ```
//! use rtklink::directory::{RankOptions, Sourcetable};
//! use rtklink::geo::Coordinates;
//!
//! let table = Sourcetable::parse(
//!     "STR;PARIS;Paris;RTCM 3.2;1004(1),1005(10);2;GPS+GLO;NET;FRA;48.85;2.35;0;0;sNTRIP;none;B;N;9600;\r\n\
//!      ENDSOURCETABLE\r\n",
//! );
//! let nearest = table.nearest(Coordinates::new(48.80, 2.30), &RankOptions::default());
//! assert_eq!(nearest[0].record.mountpoint, "PARIS");
//! ```

mod client;
mod error;
mod ranking;
mod record;
mod sourcetable;

pub use client::{DirectoryClient, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_SOURCETABLE_SIZE};
pub use error::DirectoryError;
pub use ranking::{
    rank_nearest, RankOptions, RankedMountpoint, DEFAULT_MAX_RESULTS, DEFAULT_RADIUS_KM,
};
pub use record::{MountpointRecord, Solution, STR_MIN_FIELDS};
pub use sourcetable::Sourcetable;
