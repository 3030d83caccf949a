pub mod availability;
pub mod calendar;
pub mod history;
pub mod notification;
pub mod payment;
pub mod pricing;
pub mod reservation;
pub mod session;
pub mod transitions;
