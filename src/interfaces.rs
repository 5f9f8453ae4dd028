//! External collaborator interfaces (`spec.md` §6): the core is usable
//! without any implementation of these beyond a trivial in-process one.

use hifitime::Epoch;

use crate::errors::ElementSetError;

/// One `(name, line1, line2)` triple plus optional tags, as handed to the
/// core by an `ElementSetSource` before a run starts (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct RawElementSet {
    pub catalog_id: u64,
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub primary: bool,
    pub debris: bool,
    pub rocket_body: bool,
}

/// Supplies the core with a catalog snapshot before a run. `spec.md` §6:
/// "a function returning a sequence of (name, line1, line2) triples plus
/// optional tags." Fetching happens entirely outside the core; this trait
/// only describes the boundary the core consumes.
pub trait ElementSetSource {
    fn fetch(&self) -> Result<Vec<RawElementSet>, ElementSetError>;
}

/// Injectable wall-clock source so tests can freeze time (`spec.md` §6).
pub trait Clock: Send + Sync {
    fn now(&self) -> Epoch;
}

/// Wall-clock backed [`Clock`], the default outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Epoch {
        Epoch::now().expect("system clock is readable")
    }
}

/// Receives a serialized event after each assessment (`spec.md` §6).
/// Failure of the sink must not propagate into the core's own success.
pub trait EventSink {
    fn emit(&self, event: &crate::event::Event, cdm_xml_bytes: &[u8]);
}

/// An [`EventSink`] that does nothing, for callers that only want the
/// in-memory event store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &crate::event::Event, _cdm_xml_bytes: &[u8]) {}
}
