mod in_flight;
mod listener_helper;
mod registry;

pub(crate) use in_flight::InFlight;
pub(crate) use listener_helper::{ListenerHelper, ListenerId, TypeDiff};
pub(crate) use registry::Registry;
