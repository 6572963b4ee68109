use crate::error::GraphError;
use crate::fp16;
use crate::usb_link::{LinkStatus, MyriadOpcode, NcsUsbLink};
use log::debug;

// One compiled network resident on the stick. Allocation uploads the blob,
// deallocation frees it; Drop covers the early-error paths best-effort.
pub struct Graph<'a> {
    link: &'a NcsUsbLink,
    allocated: bool,
}

impl<'a> Graph<'a> {
    pub fn allocate(link: &'a NcsUsbLink, blob: &[u8]) -> Result<Self, GraphError> {
        link.send_command(MyriadOpcode::AllocateGraph, blob)?;
        let (reply, _) = link.read_reply()?;
        if LinkStatus::from_raw(reply.status) != Some(LinkStatus::Ok) {
            return Err(GraphError::AllocationFailed(reply.status));
        }
        debug!("allocated graph ({} bytes)", blob.len());
        Ok(Self {
            link,
            allocated: true,
        })
    }

    pub fn load_tensor(&self, fp16_bytes: &[u8]) -> Result<(), GraphError> {
        self.link.send_command(MyriadOpcode::LoadTensor, fp16_bytes)?;
        let (reply, _) = self.link.read_reply()?;
        if LinkStatus::from_raw(reply.status) != Some(LinkStatus::Ok) {
            return Err(GraphError::TensorRejected(reply.status));
        }
        debug!("loaded input tensor ({} bytes)", fp16_bytes.len());
        Ok(())
    }

    pub fn get_result(&self) -> Result<Vec<f32>, GraphError> {
        self.link.send_command(MyriadOpcode::ReadResult, &[])?;
        let (reply, payload) = self.link.read_reply()?;
        if LinkStatus::from_raw(reply.status) != Some(LinkStatus::Ok) {
            return Err(GraphError::InferenceFailed(reply.status));
        }
        if payload.is_empty() {
            return Err(GraphError::EmptyResult);
        }
        if payload.len() % 2 != 0 {
            return Err(GraphError::OddResultLength(payload.len()));
        }
        debug!("read result tensor ({} fp16 values)", payload.len() / 2);
        Ok(fp16::decode_f16_slice(&payload))
    }

    pub fn deallocate(mut self) -> Result<(), GraphError> {
        self.send_deallocate()?;
        self.allocated = false;
        Ok(())
    }

    fn send_deallocate(&self) -> Result<(), GraphError> {
        self.link.send_command(MyriadOpcode::DeallocateGraph, &[])?;
        let (reply, _) = self.link.read_reply()?;
        if LinkStatus::from_raw(reply.status) != Some(LinkStatus::Ok) {
            return Err(GraphError::DeallocationFailed(reply.status));
        }
        Ok(())
    }
}

impl Drop for Graph<'_> {
    fn drop(&mut self) {
        if self.allocated {
            let _ = self.send_deallocate();
        }
    }
}
