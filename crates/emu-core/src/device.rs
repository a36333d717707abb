//! I/O devices and the port aggregation bus.

/// A peripheral attached to the I/O port space.
///
/// Devices decode port addresses themselves (Spectrum hardware decodes
/// by address-line patterns, not full equality), so reads return `None`
/// for ports the device does not answer.
pub trait IoDevice {
    /// Read from a port. `None` if this device does not respond.
    fn read_port(&mut self, port: u16, cycle: u64) -> Option<u8>;

    /// Write to a port. Writes are broadcast, so devices ignore ports
    /// they do not decode.
    fn write_port(&mut self, port: u16, value: u8, cycle: u64);
}

/// First-responder port aggregation.
///
/// Reads poll devices in attachment order; the first to answer wins.
/// Writes are broadcast to every device.
#[derive(Default)]
pub struct IoBus {
    devices: Vec<Box<dyn IoDevice>>,
}

impl IoBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Attach a device to the bus.
    pub fn add_device(&mut self, device: Box<dyn IoDevice>) {
        self.devices.push(device);
    }

    /// Poll devices in order; the first `Some` wins. `None` means no
    /// attached device decoded the port (the caller falls back to the
    /// floating bus).
    pub fn read_byte(&mut self, port: u16, cycle: u64) -> Option<u8> {
        self.devices
            .iter_mut()
            .find_map(|device| device.read_port(port, cycle))
    }

    /// Broadcast a write to every device.
    pub fn write_byte(&mut self, port: u16, value: u8, cycle: u64) {
        for device in &mut self.devices {
            device.write_port(port, value, cycle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Device answering a single port with a fixed value, counting the
    /// writes it sees.
    struct FixedPort {
        port: u16,
        value: u8,
        writes: Arc<AtomicU32>,
    }

    impl FixedPort {
        fn boxed(port: u16, value: u8, writes: &Arc<AtomicU32>) -> Box<Self> {
            Box::new(Self {
                port,
                value,
                writes: Arc::clone(writes),
            })
        }
    }

    impl IoDevice for FixedPort {
        fn read_port(&mut self, port: u16, _cycle: u64) -> Option<u8> {
            (port == self.port).then_some(self.value)
        }

        fn write_port(&mut self, port: u16, _value: u8, _cycle: u64) {
            if port == self.port {
                self.writes.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn first_responder_wins() {
        let writes = Arc::new(AtomicU32::new(0));
        let mut bus = IoBus::new();
        bus.add_device(FixedPort::boxed(0x00FE, 0x11, &writes));
        bus.add_device(FixedPort::boxed(0x00FE, 0x22, &writes));

        assert_eq!(bus.read_byte(0x00FE, 0), Some(0x11));
    }

    #[test]
    fn unclaimed_port_returns_none() {
        let writes = Arc::new(AtomicU32::new(0));
        let mut bus = IoBus::new();
        bus.add_device(FixedPort::boxed(0x00FE, 0x11, &writes));

        assert_eq!(bus.read_byte(0x1234, 0), None);
    }

    #[test]
    fn writes_are_broadcast() {
        let writes = Arc::new(AtomicU32::new(0));
        let mut bus = IoBus::new();
        bus.add_device(FixedPort::boxed(0x7FFD, 0, &writes));
        bus.add_device(FixedPort::boxed(0x7FFD, 0, &writes));

        bus.write_byte(0x7FFD, 0x17, 100);
        assert_eq!(writes.load(Ordering::Relaxed), 2, "every device sees the write");
    }
}
