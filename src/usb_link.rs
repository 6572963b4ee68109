use crate::device::{NCS_USB_PRODUCT_ID_BOOT, NCS_USB_PRODUCT_ID_RUNTIME, NCS_USB_VENDOR_ID};
use crate::error::NcsError;
use log::debug;
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, UsbContext};
use std::cmp::min;
use std::thread;
use std::time::{Duration, Instant};

pub const EP_BULK_OUT: u8 = 0x01;
pub const EP_BULK_IN: u8 = 0x81;

pub const DEFAULT_PAYLOAD_CHUNK_SIZE: usize = 0x10000;
pub const DEFAULT_BOOT_WAIT: Duration = Duration::from_secs(5);

const BOOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MyriadOpcode {
    AllocateGraph = 1,
    DeallocateGraph = 2,
    LoadTensor = 3,
    ReadResult = 4,
}

impl MyriadOpcode {
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            MyriadOpcode::AllocateGraph => "AllocateGraph",
            MyriadOpcode::DeallocateGraph => "DeallocateGraph",
            MyriadOpcode::LoadTensor => "LoadTensor",
            MyriadOpcode::ReadResult => "ReadResult",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Ok,
    Busy,
    MyriadError,
    InvalidGraph,
}

impl LinkStatus {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(LinkStatus::Ok),
            1 => Some(LinkStatus::Busy),
            2 => Some(LinkStatus::MyriadError),
            3 => Some(LinkStatus::InvalidGraph),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LinkStatus::Ok => "Ok",
            LinkStatus::Busy => "Busy",
            LinkStatus::MyriadError => "MyriadError",
            LinkStatus::InvalidGraph => "InvalidGraph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub opcode: u32,
    pub payload_len: u32,
}

impl CommandHeader {
    pub const fn new(opcode: MyriadOpcode, payload_len: u32) -> Self {
        Self {
            opcode: opcode.as_u32(),
            payload_len,
        }
    }

    pub const fn to_le_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        let opcode = self.opcode.to_le_bytes();
        let len = self.payload_len.to_le_bytes();
        out[0] = opcode[0];
        out[1] = opcode[1];
        out[2] = opcode[2];
        out[3] = opcode[3];
        out[4] = len[0];
        out[5] = len[1];
        out[6] = len[2];
        out[7] = len[3];
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub status: u32,
    pub payload_len: u32,
}

impl ReplyHeader {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < 8 {
            return None;
        }
        let status = u32::from_le_bytes(buf[0..4].try_into().ok()?);
        let payload_len = u32::from_le_bytes(buf[4..8].try_into().ok()?);
        Some(Self {
            status,
            payload_len,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NcsUsbDeviceInfo {
    pub bus: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl NcsUsbDeviceInfo {
    pub const fn is_runtime(self) -> bool {
        self.vendor_id == NCS_USB_VENDOR_ID && self.product_id == NCS_USB_PRODUCT_ID_RUNTIME
    }
}

pub struct NcsUsbLink {
    _context: Context,
    handle: DeviceHandle<Context>,
    info: NcsUsbDeviceInfo,
    timeout: Duration,
    payload_chunk_size: usize,
    claimed_interface: Option<u8>,
}

impl NcsUsbLink {
    pub fn list_devices() -> Result<Vec<NcsUsbDeviceInfo>, NcsError> {
        let context = Context::new().map_err(NcsError::from)?;
        let devices = collect_ncs_devices(&context)?;
        Ok(devices
            .into_iter()
            .map(|(device, desc)| NcsUsbDeviceInfo {
                bus: device.bus_number(),
                address: device.address(),
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
            })
            .collect())
    }

    pub fn open_first_prefer_runtime(timeout: Duration) -> Result<Self, NcsError> {
        let context = Context::new().map_err(NcsError::from)?;
        let devices = collect_ncs_devices(&context)?;
        if devices.is_empty() {
            return Err(NcsError::DeviceNotFound);
        }

        let preferred = devices
            .iter()
            .find(|d| d.1.product_id() == NCS_USB_PRODUCT_ID_RUNTIME)
            .or_else(|| devices.first())
            .ok_or(NcsError::DeviceNotFound)?;

        let info = NcsUsbDeviceInfo {
            bus: preferred.0.bus_number(),
            address: preferred.0.address(),
            vendor_id: preferred.1.vendor_id(),
            product_id: preferred.1.product_id(),
        };
        let handle = preferred.0.open().map_err(NcsError::from)?;
        let _ = handle.set_auto_detach_kernel_driver(true);

        debug!(
            "opened NCS at bus {} address {} (pid 0x{:04x})",
            info.bus, info.address, info.product_id
        );

        Ok(Self {
            _context: context,
            handle,
            info,
            timeout,
            payload_chunk_size: DEFAULT_PAYLOAD_CHUNK_SIZE,
            claimed_interface: None,
        })
    }

    // Consumes a boot-mode link: pushes the firmware blob, waits for the stick
    // to drop off the bus and come back with the runtime PID, then reopens it.
    pub fn boot_with_firmware(
        mut self,
        firmware: &[u8],
        boot_wait: Duration,
    ) -> Result<Self, NcsError> {
        if self.is_runtime_device() {
            return Ok(self);
        }

        self.set_configuration_1()?;
        self.claim_interface0()?;
        self.upload_firmware(firmware)?;
        let timeout = self.timeout;
        drop(self);

        let deadline = Instant::now() + boot_wait;
        loop {
            if runtime_device_present()? {
                break;
            }
            if Instant::now() >= deadline {
                return Err(NcsError::BootFailed);
            }
            thread::sleep(BOOT_POLL_INTERVAL);
        }

        let link = Self::open_first_prefer_runtime(timeout)?;
        if !link.is_runtime_device() {
            return Err(NcsError::BootFailed);
        }
        Ok(link)
    }

    pub fn device_info(&self) -> NcsUsbDeviceInfo {
        self.info
    }

    pub fn is_runtime_device(&self) -> bool {
        self.info.is_runtime()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_payload_chunk_size(&mut self, chunk_size: usize) -> Result<(), NcsError> {
        if chunk_size == 0 {
            return Err(NcsError::ProtocolError(
                "payload chunk size must be non-zero".to_string(),
            ));
        }
        self.payload_chunk_size = chunk_size;
        Ok(())
    }

    pub fn set_configuration_1(&self) -> Result<(), NcsError> {
        self.handle
            .set_active_configuration(1)
            .map_err(NcsError::from)
    }

    pub fn claim_interface0(&mut self) -> Result<(), NcsError> {
        if self.claimed_interface.is_none() {
            self.handle.claim_interface(0).map_err(NcsError::from)?;
            self.claimed_interface = Some(0);
        }
        Ok(())
    }

    pub fn release_claimed_interface(&mut self) {
        if let Some(intf) = self.claimed_interface.take() {
            let _ = self.handle.release_interface(intf);
        }
    }

    pub fn upload_firmware(&self, firmware: &[u8]) -> Result<(), NcsError> {
        debug!("uploading {} bytes of firmware", firmware.len());
        let mut offset = 0usize;
        while offset < firmware.len() {
            let chunk_len = min(self.payload_chunk_size, firmware.len() - offset);
            if let Err(err) = self.write_bulk_all(EP_BULK_OUT, &firmware[offset..offset + chunk_len])
            {
                return Err(NcsError::ProtocolError(format!(
                    "firmware write failed at offset {} of {} bytes: {}",
                    offset,
                    firmware.len(),
                    err
                )));
            }
            offset += chunk_len;
        }
        Ok(())
    }

    pub fn send_command(&self, opcode: MyriadOpcode, payload: &[u8]) -> Result<(), NcsError> {
        if payload.len() > u32::MAX as usize {
            return Err(NcsError::ProtocolError(format!(
                "{} payload too large: {} bytes",
                opcode.name(),
                payload.len()
            )));
        }

        let header = CommandHeader::new(opcode, payload.len() as u32).to_le_bytes();
        self.write_bulk_all(EP_BULK_OUT, &header)?;

        let mut offset = 0usize;
        while offset < payload.len() {
            let chunk_len = min(self.payload_chunk_size, payload.len() - offset);
            if let Err(err) = self.write_bulk_all(EP_BULK_OUT, &payload[offset..offset + chunk_len])
            {
                return Err(NcsError::ProtocolError(format!(
                    "{} payload write failed at offset {} of {} bytes: {}",
                    opcode.name(),
                    offset,
                    payload.len(),
                    err
                )));
            }
            offset += chunk_len;
        }

        Ok(())
    }

    pub fn read_reply_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<(ReplyHeader, Vec<u8>), NcsError> {
        let mut buf = [0u8; 8];
        let read = self
            .handle
            .read_bulk(EP_BULK_IN, &mut buf, timeout)
            .map_err(NcsError::from)?;
        let header = ReplyHeader::decode(&buf[..read]).ok_or_else(|| {
            NcsError::ProtocolError(format!("failed to decode reply header from {} bytes", read))
        })?;

        let mut payload = vec![0u8; header.payload_len as usize];
        let mut filled = 0usize;
        while filled < payload.len() {
            let read = self
                .handle
                .read_bulk(EP_BULK_IN, &mut payload[filled..], timeout)
                .map_err(NcsError::from)?;
            if read == 0 {
                return Err(NcsError::ProtocolError(format!(
                    "reply payload truncated at {} of {} bytes",
                    filled,
                    payload.len()
                )));
            }
            filled += read;
        }

        Ok((header, payload))
    }

    pub fn read_reply(&self) -> Result<(ReplyHeader, Vec<u8>), NcsError> {
        self.read_reply_with_timeout(self.timeout)
    }

    pub fn reset_device(&self) -> Result<(), NcsError> {
        self.handle.reset().map_err(NcsError::from)
    }

    fn write_bulk_all(&self, endpoint: u8, mut buf: &[u8]) -> Result<(), NcsError> {
        while !buf.is_empty() {
            let written = self
                .handle
                .write_bulk(endpoint, buf, self.timeout)
                .map_err(|err| {
                    NcsError::ProtocolError(format!(
                        "bulk write failed on endpoint 0x{endpoint:02x}: {}",
                        err
                    ))
                })?;
            if written == 0 {
                return Err(NcsError::ProtocolError(format!(
                    "zero-length bulk write on endpoint 0x{endpoint:02x}"
                )));
            }
            buf = &buf[written..];
        }
        Ok(())
    }
}

impl Drop for NcsUsbLink {
    fn drop(&mut self) {
        self.release_claimed_interface();
    }
}

fn is_ncs(desc: &DeviceDescriptor) -> bool {
    desc.vendor_id() == NCS_USB_VENDOR_ID
        && (desc.product_id() == NCS_USB_PRODUCT_ID_BOOT
            || desc.product_id() == NCS_USB_PRODUCT_ID_RUNTIME)
}

fn runtime_device_present() -> Result<bool, NcsError> {
    let context = Context::new().map_err(NcsError::from)?;
    let devices = collect_ncs_devices(&context)?;
    Ok(devices
        .iter()
        .any(|d| d.1.product_id() == NCS_USB_PRODUCT_ID_RUNTIME))
}

fn collect_ncs_devices(
    context: &Context,
) -> Result<Vec<(Device<Context>, DeviceDescriptor)>, NcsError> {
    let devices = context.devices().map_err(NcsError::from)?;
    let mut out = Vec::new();
    for device in devices.iter() {
        let desc = device.device_descriptor().map_err(NcsError::from)?;
        if is_ncs(&desc) {
            out.push((device, desc));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_header_is_little_endian() {
        let bytes = CommandHeader::new(MyriadOpcode::LoadTensor, 0x11223344).to_le_bytes();
        assert_eq!(bytes, [0x03, 0x00, 0x00, 0x00, 0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn decode_reply_header() {
        let raw = [
            0x00, 0x00, 0x00, 0x00, // status
            0xd0, 0x07, 0x00, 0x00, // payload len
        ];
        let reply = ReplyHeader::decode(&raw).expect("decode");
        assert_eq!(reply.status, 0);
        assert_eq!(reply.payload_len, 2000);
    }

    #[test]
    fn decode_reply_header_rejects_short_buffers() {
        assert!(ReplyHeader::decode(&[0x00, 0x01, 0x02]).is_none());
    }

    #[test]
    fn link_status_round_trip() {
        assert_eq!(LinkStatus::from_raw(0), Some(LinkStatus::Ok));
        assert_eq!(LinkStatus::from_raw(3), Some(LinkStatus::InvalidGraph));
        assert_eq!(LinkStatus::from_raw(42), None);
        assert_eq!(LinkStatus::MyriadError.name(), "MyriadError");
        assert_eq!(MyriadOpcode::ReadResult.name(), "ReadResult");
    }

    #[test]
    fn runtime_info_requires_runtime_pid() {
        let boot = NcsUsbDeviceInfo {
            bus: 1,
            address: 4,
            vendor_id: NCS_USB_VENDOR_ID,
            product_id: NCS_USB_PRODUCT_ID_BOOT,
        };
        assert!(!boot.is_runtime());

        let runtime = NcsUsbDeviceInfo {
            product_id: NCS_USB_PRODUCT_ID_RUNTIME,
            ..boot
        };
        assert!(runtime.is_runtime());
    }
}
