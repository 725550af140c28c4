//! crates/access/src/identity/groups.rs
//! Growable group-list enumeration.
//!
//! `getgrouplist(3)` fills a caller-supplied array and fails when the array is
//! too small, so the number of memberships has to be discovered by retrying.
//! [`load_groups`] owns that loop: it starts from a small guess, grows by a
//! fixed increment, and refuses any capacity whose byte size cannot be
//! represented before it allocates.

use std::ffi::c_int;
use std::io;
use std::mem::size_of;

use super::{GroupList, RawGid};
use crate::error::AccessError;

/// Sizing policy for the group buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GroupBufferPolicy {
    initial_capacity: usize,
    increment: usize,
}

impl GroupBufferPolicy {
    /// Default number of slots for the first enumeration attempt.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 10;

    /// Default number of slots added per retry.
    pub const DEFAULT_INCREMENT: usize = 100;

    /// Creates the default policy (10 slots, growing by 100).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            increment: Self::DEFAULT_INCREMENT,
        }
    }

    /// Sets the capacity of the first attempt.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the growth increment. Zero is clamped to one so retries always
    /// make progress.
    #[must_use]
    pub const fn increment(mut self, increment: usize) -> Self {
        self.increment = if increment == 0 { 1 } else { increment };
        self
    }

    /// Returns the capacity of the first attempt.
    pub const fn first_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Returns the growth increment.
    pub const fn growth(&self) -> usize {
        self.increment
    }

    /// Computes the next capacity after an attempt with `current` slots that
    /// reported `reported` memberships.
    ///
    /// Returns `None` when the capacity, its size in bytes, or the `int` count
    /// handed to the enumeration would overflow.
    pub fn next_capacity(&self, current: usize, reported: usize) -> Option<usize> {
        let capacity = current.max(reported).checked_add(self.increment)?;
        let bytes = capacity.checked_mul(size_of::<RawGid>())?;
        if bytes > isize::MAX as usize || c_int::try_from(capacity).is_err() {
            return None;
        }
        Some(capacity)
    }
}

impl Default for GroupBufferPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one enumeration attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Enumeration {
    /// The buffer held every membership; the first `n` slots are filled.
    Complete(usize),
    /// The buffer was too small.
    Insufficient {
        /// Membership count reported by the enumeration. Implementations that
        /// cannot tell report the capacity they were given.
        reported: usize,
    },
}

/// One attempt at listing a user's groups into a fixed-size buffer.
pub trait GroupEnumerator {
    /// Fills `buffer` with the groups of `user`, including `primary_gid`.
    fn enumerate(
        &self,
        user: &str,
        primary_gid: RawGid,
        buffer: &mut [RawGid],
    ) -> io::Result<Enumeration>;
}

impl<T: GroupEnumerator + ?Sized> GroupEnumerator for &T {
    fn enumerate(
        &self,
        user: &str,
        primary_gid: RawGid,
        buffer: &mut [RawGid],
    ) -> io::Result<Enumeration> {
        (**self).enumerate(user, primary_gid, buffer)
    }
}

/// Enumerates every group of `user`, growing the buffer until it fits.
///
/// Each retry resizes the same owned buffer, so only the final allocation
/// survives and it is released with the returned [`GroupList`] (or on the
/// error path, when the buffer goes out of scope).
pub fn load_groups<E>(
    enumerator: &E,
    user: &str,
    primary_gid: RawGid,
    policy: GroupBufferPolicy,
) -> Result<GroupList, AccessError>
where
    E: GroupEnumerator + ?Sized,
{
    let mut buffer: Vec<RawGid> = vec![0; policy.first_capacity()];
    loop {
        let attempt = enumerator
            .enumerate(user, primary_gid, &mut buffer)
            .map_err(|error| AccessError::system("enumerate groups", error))?;

        match attempt {
            Enumeration::Complete(count) => {
                buffer.truncate(count);
                logging::trace_ident!("user '{}' is in {} groups", user, buffer.len());
                return Ok(GroupList::from(buffer));
            }
            Enumeration::Insufficient { reported } => {
                let current = buffer.len();
                let Some(capacity) = policy.next_capacity(current, reported) else {
                    logging::trace_ident!(
                        "group buffer for '{}' cannot grow past {} slots",
                        user,
                        current
                    );
                    return Err(AccessError::Overflow {
                        user: user.to_owned(),
                        requested: current.max(reported).saturating_add(policy.growth()),
                    });
                };
                logging::trace_ident!(
                    "group buffer for '{}' too small ({} slots, {} reported), growing to {}",
                    user,
                    current,
                    reported,
                    capacity
                );
                buffer.resize(capacity, 0);
            }
        }
    }
}
