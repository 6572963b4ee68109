use crate::error::NcsError;
use rusb::{Context, Device, DeviceDescriptor, UsbContext};
use std::time::Duration;

pub const NCS_USB_VENDOR_ID: u16 = 0x03e7;

// PID before the MvNCAPI firmware is uploaded.
pub const NCS_USB_PRODUCT_ID_BOOT: u16 = 0x2150;

// PID after the stick reboots into the loaded firmware.
pub const NCS_USB_PRODUCT_ID_RUNTIME: u16 = 0xf63b;

pub struct NcsDevice {
    is_valid: bool,
    name: Option<String>,
    vendor_id: u16,
    product_id: u16,
}

impl NcsDevice {
    pub fn new() -> Result<Self, NcsError> {
        find_ncs_devices()?
            .into_iter()
            .next()
            .ok_or(NcsError::DeviceNotFound)
    }

    pub fn with_device_name(device_name: &str) -> Result<Self, NcsError> {
        if device_name.is_empty() {
            return Err(NcsError::InvalidDeviceName);
        }

        let mut device = find_ncs_devices()?
            .into_iter()
            .next()
            .ok_or(NcsError::DeviceNotFound)?;
        device.name = Some(device_name.to_string());
        Ok(device)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_booted(&self) -> bool {
        self.product_id == NCS_USB_PRODUCT_ID_RUNTIME
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

impl Drop for NcsDevice {
    fn drop(&mut self) {
        self.is_valid = false;
    }
}

pub fn is_device_connected() -> bool {
    match find_ncs_devices() {
        Ok(devices) => !devices.is_empty(),
        Err(_) => false,
    }
}

fn find_ncs_devices() -> Result<Vec<NcsDevice>, NcsError> {
    let context = match Context::new() {
        Ok(ctx) => ctx,
        Err(_) => return Err(NcsError::DeviceNotFound),
    };

    let devices = match context.devices() {
        Ok(devs) => devs,
        Err(_) => return Err(NcsError::DeviceNotFound),
    };

    let mut ncs_devices = Vec::new();

    for device in devices.iter() {
        let desc = match device.device_descriptor() {
            Ok(d) => d,
            Err(_) => continue,
        };

        if desc.vendor_id() == NCS_USB_VENDOR_ID
            && (desc.product_id() == NCS_USB_PRODUCT_ID_BOOT
                || desc.product_id() == NCS_USB_PRODUCT_ID_RUNTIME)
        {
            let name = get_device_name(&device, &desc);
            ncs_devices.push(NcsDevice {
                is_valid: true,
                name,
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
            });
        }
    }

    if ncs_devices.is_empty() {
        Err(NcsError::DeviceNotFound)
    } else {
        Ok(ncs_devices)
    }
}

fn get_device_name(device: &Device<Context>, desc: &DeviceDescriptor) -> Option<String> {
    let timeout = Duration::from_secs(1);

    if let Ok(handle) = device.open() {
        if let Ok(languages) = handle.read_languages(timeout) {
            if !languages.is_empty() {
                if let Ok(manufacturer) =
                    handle.read_manufacturer_string(languages[0], desc, timeout)
                {
                    return Some(manufacturer);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_device_name_is_invalid() {
        assert!(matches!(
            NcsDevice::with_device_name(""),
            Err(NcsError::InvalidDeviceName)
        ));
    }
}
