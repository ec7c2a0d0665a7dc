//! Domain models for the attendance client.

pub mod attendance;
pub mod envelope;
pub mod location;
pub mod session;
pub mod user;
pub mod zone;

pub use attendance::{AttendanceRecord, AttendanceStatus, CheckInRequest, CheckOutRequest};
pub use envelope::{ApiEnvelope, EnvelopeError};
pub use location::{Coordinates, LocationSample};
pub use session::{KeyValueStore, MemoryStore, Session, SessionError, StoreError};
pub use user::{Role, UserProfile};
pub use zone::{Track, Zone};
