pub mod booking;
pub mod profile;
pub mod workspace;

pub use booking::{Booking, BookingEvent, BookingEventKind, BookingHistory, BookingStatus, NewBooking};
pub use profile::{Profile, UserType};
pub use workspace::{Workspace, WorkspaceFilter};
