//! Byte transport abstraction.
//!
//! The handshake engine drives any `Read + Write` byte stream. The three
//! extra methods are socket coalescing hints; they default to no-ops so
//! in-memory transports and tests need nothing special.

use std::io::{Read, Write};
use std::net::TcpStream;

/// A bidirectional byte transport with optional coalescing hints.
pub trait Transport: Read + Write {
    /// Hint: delay small writes, a flight is being produced.
    fn cork(&mut self) {}

    /// Hint: stop delaying writes.
    fn uncork(&mut self) {}

    /// Hint: acknowledge received data immediately; delayed ACKs add
    /// artificial round trips to the handshake.
    fn quickack(&mut self) {}
}

impl Transport for TcpStream {
    #[cfg(target_os = "linux")]
    fn cork(&mut self) {
        set_tcp_option(self, libc::TCP_CORK, 1);
    }

    #[cfg(target_os = "linux")]
    fn uncork(&mut self) {
        set_tcp_option(self, libc::TCP_CORK, 0);
    }

    #[cfg(target_os = "linux")]
    fn quickack(&mut self) {
        set_tcp_option(self, libc::TCP_QUICKACK, 1);
    }
}

/// Best-effort socket option set; hints are allowed to fail silently.
#[cfg(target_os = "linux")]
fn set_tcp_option(stream: &TcpStream, option: libc::c_int, value: libc::c_int) {
    use std::os::unix::io::AsRawFd;

    unsafe {
        libc::setsockopt(
            stream.as_raw_fd(),
            libc::IPPROTO_TCP,
            option,
            &value as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}
