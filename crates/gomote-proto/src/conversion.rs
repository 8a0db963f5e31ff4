use crate::v1;
use crate::v1::create_instance_response::Status;
use gomote_core::{CreationRequest, CreationUpdate, InstanceId};
use std::convert::TryFrom;

// CreateInstanceRequest
impl From<CreationRequest> for v1::CreateInstanceRequest {
    fn from(req: CreationRequest) -> Self {
        Self {
            builder_type: req.builder_type,
        }
    }
}

// CreateInstanceResponse
//
// Anything other than COMPLETE, including values this client does not know,
// is reported as still pending.
impl TryFrom<v1::CreateInstanceResponse> for CreationUpdate {
    type Error = String;

    fn try_from(res: v1::CreateInstanceResponse) -> Result<Self, Self::Error> {
        match res.status() {
            Status::Complete => {
                let gomote_id = res
                    .instance
                    .map(|instance| instance.gomote_id)
                    .ok_or("instance is missing from COMPLETE update")?;
                let instance_id = InstanceId::new(gomote_id).map_err(|e| e.to_string())?;
                Ok(CreationUpdate::Complete { instance_id })
            }
            Status::Waiting | Status::Unknown => Ok(CreationUpdate::Pending {
                waiters_ahead: res.waiters_ahead,
            }),
        }
    }
}
