//! Serial port access to the meter's Teleinfo output.

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

/// Open and configure the serial device carrying Teleinfo frames.
///
/// The meter's line discipline is fixed by the protocol: 1200 baud, 7 data
/// bits, even parity, 1 stop bit, no flow control. The read timeout is long
/// because a frame arrives roughly every second at this rate.
pub fn open_port(device: &str) -> serialport::Result<Box<dyn SerialPort>> {
    let port = serialport::new(device, 1200)
        .data_bits(DataBits::Seven)
        .parity(Parity::Even)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_secs(10))
        .open()?;

    log::info!("Opened serial port {} (1200 baud, 7E1)", device);
    Ok(port)
}
