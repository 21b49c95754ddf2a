use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// An opaque, non-negative reference to a resource owned by a session.
///
/// The upper 32 bits identify the session which issued the handle and the lower 32 bits
/// the slot of the resource in the session's table. Slots are never reused, so a closed
/// handle stays invalid for the whole lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub(crate) u64);

impl Handle {
    fn new(session_id: u32, slot: u32) -> Handle {
        Handle((u64::from(session_id) << 32) | u64::from(slot))
    }

    /// The raw integer value of the handle.
    pub fn value(self) -> u64 {
        self.0
    }

    fn session_id(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub(crate) fn slot(self) -> usize {
        (self.0 & u64::from(u32::MAX)) as usize
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The kinds of resources a handle can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Font,
    Image,
    ImportedDocument,
    ImportedPage,
    IccProfile,
    GState,
    Shading,
    Template,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Font => "font",
            ResourceKind::Image => "image",
            ResourceKind::ImportedDocument => "imported document",
            ResourceKind::ImportedPage => "imported page",
            ResourceKind::IccProfile => "ICC profile",
            ResourceKind::GState => "graphics state",
            ResourceKind::Shading => "shading",
            ResourceKind::Template => "template",
        };
        formatter.write_str(name)
    }
}

/// Anything which can be stored in a `ResourceTable`.
pub(crate) trait Tagged {
    fn kind(&self) -> ResourceKind;
}

/// An arena of resources addressed by handles. Removing a resource leaves a tombstone in
/// its slot.
#[derive(Debug)]
pub(crate) struct ResourceTable<R> {
    session_id: u32,
    slots: Vec<Option<R>>,
}

impl<R: Tagged> ResourceTable<R> {
    pub(crate) fn new(session_id: u32) -> Self {
        ResourceTable {
            session_id,
            slots: Vec::new(),
        }
    }

    /// The handle the next inserted resource will receive.
    pub(crate) fn next_handle(&self) -> Handle {
        Handle::new(self.session_id, self.slots.len() as u32)
    }

    pub(crate) fn insert(&mut self, resource: R) -> Handle {
        let handle = self.next_handle();
        self.slots.push(Some(resource));
        handle
    }

    /// Looks up a resource which must be of one of the `expected` kinds.
    pub(crate) fn get(&self, handle: Handle, expected: &[ResourceKind]) -> Result<&R, SessionError> {
        let slot = self.slot_index(handle)?;
        let resource = self.slots[slot]
            .as_ref()
            .ok_or_else(|| SessionError::invalid_handle(format!("Handle {} has been closed", handle)))?;
        check_kind(handle, resource.kind(), expected)?;
        Ok(resource)
    }

    pub(crate) fn get_mut(
        &mut self,
        handle: Handle,
        expected: &[ResourceKind],
    ) -> Result<&mut R, SessionError> {
        let slot = self.slot_index(handle)?;
        let resource = self.slots[slot]
            .as_mut()
            .ok_or_else(|| SessionError::invalid_handle(format!("Handle {} has been closed", handle)))?;
        check_kind(handle, resource.kind(), expected)?;
        Ok(resource)
    }

    /// Removes a resource, the handle becomes permanently invalid.
    pub(crate) fn remove(&mut self, handle: Handle, expected: &[ResourceKind]) -> Result<R, SessionError> {
        self.get(handle, expected)?;
        let slot = self.slot_index(handle)?;
        self.slots[slot]
            .take()
            .ok_or_else(|| SessionError::invalid_handle(format!("Handle {} has been closed", handle)))
    }

    /// Drops every resource, leaving all the slots tombstoned.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    fn slot_index(&self, handle: Handle) -> Result<usize, SessionError> {
        if handle.session_id() != self.session_id {
            return Err(SessionError::invalid_handle(format!(
                "Handle {} belongs to another session",
                handle
            )));
        }
        let slot = handle.slot();
        if slot >= self.slots.len() {
            return Err(SessionError::invalid_handle(format!(
                "Handle {} was never issued",
                handle
            )));
        }
        Ok(slot)
    }
}

fn check_kind(handle: Handle, kind: ResourceKind, expected: &[ResourceKind]) -> Result<(), SessionError> {
    if expected.contains(&kind) {
        Ok(())
    } else {
        Err(SessionError::invalid_handle(format!(
            "Handle {} refers to a {} where a {} is expected",
            handle,
            kind,
            expected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct Dummy(ResourceKind);

    impl Tagged for Dummy {
        fn kind(&self) -> ResourceKind {
            self.0
        }
    }

    #[test]
    fn removed_handles_stay_invalid() {
        let mut table = ResourceTable::new(7);
        let first = table.insert(Dummy(ResourceKind::Image));
        table.remove(first, &[ResourceKind::Image]).unwrap();
        let second = table.insert(Dummy(ResourceKind::Image));
        assert_ne!(first, second);
        let error = table.get(first, &[ResourceKind::Image]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidHandle);
        assert!(table.get(second, &[ResourceKind::Image]).is_ok());
    }

    #[test]
    fn handles_of_other_sessions_are_rejected() {
        let mut first_table = ResourceTable::new(1);
        let mut second_table = ResourceTable::new(2);
        let handle = first_table.insert(Dummy(ResourceKind::Font));
        second_table.insert(Dummy(ResourceKind::Font));
        let error = second_table.get(handle, &[ResourceKind::Font]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidHandle);
    }

    #[test]
    fn kinds_are_checked() {
        let mut table = ResourceTable::new(3);
        let handle = table.insert(Dummy(ResourceKind::Font));
        let error = table
            .get(handle, &[ResourceKind::Image, ResourceKind::Template])
            .unwrap_err();
        assert!(error.context.contains("image or template"));
    }
}
