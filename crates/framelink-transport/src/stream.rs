use std::io::{Read, Write};
use std::time::Duration;

/// A byte stream the packet driver can run on.
///
/// Anything `Read + Write` qualifies as long as it can bound a blocking
/// read, which is what lets the driver honor first-byte and whole-packet
/// timeouts. `None` clears the bound.
pub trait PacketStream: Read + Write {
    /// Bound the next blocking reads to `timeout`.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl PacketStream for std::os::unix::net::UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }
}

impl PacketStream for std::net::TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::net::TcpStream::set_read_timeout(self, timeout)
    }
}
