use std::collections::BTreeMap;

use crate::domain::foundation::{ScheduleId, Timestamp};

use super::{BatchMember, BatchOptions};

/// Members sharing one run time, waiting to be submitted as a batch.
#[derive(Debug, Clone)]
pub struct ScheduledBatch {
    pub id: ScheduleId,
    pub members: Vec<BatchMember>,
    pub options: BatchOptions,
    pub run_at: Timestamp,
}

impl ScheduledBatch {
    /// Splits one schedule request into a batch per distinct `scheduled_at`,
    /// earliest first. Members without a time run at `now`. Every group keeps
    /// the request's id and options; members keep their request order.
    pub fn group(members: Vec<BatchMember>, options: BatchOptions, now: Timestamp) -> Vec<Self> {
        let id = ScheduleId::new();
        let mut by_time: BTreeMap<Timestamp, Vec<BatchMember>> = BTreeMap::new();
        for member in members {
            by_time
                .entry(member.scheduled_at.unwrap_or(now))
                .or_default()
                .push(member);
        }
        by_time
            .into_iter()
            .map(|(run_at, members)| Self {
                id,
                members,
                options: options.clone(),
                run_at,
            })
            .collect()
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.run_at.is_after(&now)
    }
}
