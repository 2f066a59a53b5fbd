//! Kernel eventfd notifier.
//!
//! A thin owner around the descriptor returned by `eventfd(2)`. Signalling
//! writes an 8-byte native-endian integer, which is exactly what glibc's
//! `eventfd_write` does, so each [`signal`](Notifier::signal) is one
//! `write(2)` system call.

use std::io;
use std::ops::BitOr;
use std::os::unix::io::{AsRawFd, RawFd};

use super::Notifier;
use crate::error::{BenchError, Result};

/// Flags accepted by `eventfd(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFdFlags(libc::c_int);

impl EventFdFlags {
    /// Reads and writes fail with `EAGAIN` instead of blocking.
    pub const NONBLOCK: Self = Self(libc::EFD_NONBLOCK);
    /// Close the descriptor on `execve`.
    pub const CLOEXEC: Self = Self(libc::EFD_CLOEXEC);
    /// Reads decrement the counter by one instead of resetting it.
    pub const SEMAPHORE: Self = Self(libc::EFD_SEMAPHORE);

    /// No flags: blocking, inherited across exec, counter mode.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw flag bits.
    pub const fn bits(self) -> libc::c_int {
        self.0
    }

    /// Whether every flag in `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventFdFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An owned eventfd descriptor.
///
/// Closed on drop.
#[derive(Debug)]
pub struct EventFd {
    fd: RawFd,
    flags: EventFdFlags,
}

impl EventFd {
    /// Create an eventfd with initial value 0 and no flags.
    ///
    /// This is the `eventfd(0, 0)` call the benchmark measures against.
    pub fn new() -> Result<Self> {
        Self::with_flags(0, EventFdFlags::empty())
    }

    /// Create an eventfd with an explicit initial value and flags.
    pub fn with_flags(initval: u32, flags: EventFdFlags) -> Result<Self> {
        let fd = unsafe { libc::eventfd(initval as libc::c_uint, flags.bits()) };

        if fd == -1 {
            return Err(BenchError::Create(io::Error::last_os_error()));
        }

        Ok(Self { fd, flags })
    }

    /// The raw descriptor number.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Flags the descriptor was created with.
    pub fn flags(&self) -> EventFdFlags {
        self.flags
    }

    /// Read the counter.
    ///
    /// In counter mode this returns the accumulated value and resets it to
    /// zero; in semaphore mode it returns 1 and decrements. With a zero
    /// counter the call blocks, or fails with `WouldBlock` when the
    /// descriptor is non-blocking.
    pub fn read(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        let n = unsafe { libc::read(self.fd, bytes.as_mut_ptr().cast(), bytes.len()) };

        if n < 0 {
            return Err(BenchError::Io(io::Error::last_os_error()));
        }
        if n as usize != bytes.len() {
            return Err(BenchError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "short read from eventfd",
            )));
        }

        Ok(u64::from_ne_bytes(bytes))
    }

    #[inline]
    fn write_counter(&self, value: u64) -> io::Result<()> {
        let bytes = value.to_ne_bytes();
        let n = unsafe { libc::write(self.fd, bytes.as_ptr().cast(), bytes.len()) };

        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write to eventfd",
            ));
        }

        Ok(())
    }
}

impl AsRawFd for EventFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for EventFd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Notifier for EventFd {
    #[inline]
    fn signal(&mut self, value: u64) -> io::Result<()> {
        self.write_counter(value)
    }

    fn name(&self) -> &'static str {
        "eventfd"
    }
}
