//! Request model
//!
//! A request is a unit of control-plane work admitted by one instance.
//! It occupies one admission slot from `admission_time` until
//! `completion_time`, when the timeline releases it.
//!
//! A request never owns its instance: it refers to it by `InstanceId`, an
//! index into the fleet.

use crate::core::time::SimTime;
use crate::models::instance::InstanceId;
use serde::{Deserialize, Serialize};

/// Unique, monotonically assigned request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// One admitted unit of work
///
/// # Example
/// ```
/// use amf_simulator_core::{InstanceId, Request, RequestId};
///
/// let req = Request::new(RequestId(7), InstanceId(0), 40, 9);
/// assert_eq!(req.completion_time(), 49);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    instance_id: InstanceId,
    admission_time: SimTime,
    completion_time: SimTime,
}

impl Request {
    /// Create a request admitted at `admission_time` that runs for `execution_duration`
    pub fn new(
        id: RequestId,
        instance_id: InstanceId,
        admission_time: SimTime,
        execution_duration: SimTime,
    ) -> Self {
        Self {
            id,
            instance_id,
            admission_time,
            completion_time: admission_time.saturating_add(execution_duration),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Instance holding this request's slot
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn admission_time(&self) -> SimTime {
        self.admission_time
    }

    pub fn completion_time(&self) -> SimTime {
        self.completion_time
    }
}
