//! Revision demand and slot engine.
//!
//! Each upcoming exam becomes a [`RevisionDemand`]: a number of fixed-size
//! slots derived from the exam type and the student's preparedness. Slots
//! are then laid onto the horizon in three phases that never revisit an
//! earlier one:
//!
//! 1. **Golden lock**: a `FINAL:` block on the day before the exam.
//! 2. **Greedy fill**: repeated passes over the horizon, one slot per day per
//!    pass, always serving the most urgent demand that fits.
//! 3. **Cramming**: whatever is still owed is forced onto the last day
//!    before the exam as `Extra Prep`, overloading it if necessary.
//!
//! Revision never lands on or after an exam's date.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::capacity::RemainingCapacity;
use super::plan::{Bucket, PlannedRevisionSlot, RevisionSummary, SlotTier, Unscheduled, UnscheduledReason};
use crate::calendar::{add_days, days_between};
use crate::schedule::{Exam, ExamType};

/// Preparedness assumed when the student has not rated an exam.
pub const DEFAULT_PREPAREDNESS: u8 = 50;

/// Floor of the preparedness multiplier.
pub const MIN_MULTIPLIER: f64 = 0.4;

/// Fixed sizing for one exam type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotProfile {
    pub base_minutes: u32,
    pub slot_minutes: u32,
    pub max_slots_per_day: u32,
    pub lock_minutes: u32,
    /// Tie-break when two exams are equally close; higher wins.
    pub priority: u8,
}

impl ExamType {
    pub fn profile(&self) -> SlotProfile {
        match self {
            ExamType::Internal => SlotProfile {
                base_minutes: 120,
                slot_minutes: 30,
                max_slots_per_day: 2,
                lock_minutes: 60,
                priority: 1,
            },
            ExamType::Board => SlotProfile {
                base_minutes: 480,
                slot_minutes: 45,
                max_slots_per_day: 3,
                lock_minutes: 120,
                priority: 2,
            },
            ExamType::Competitive => SlotProfile {
                base_minutes: 600,
                slot_minutes: 60,
                max_slots_per_day: 3,
                lock_minutes: 120,
                priority: 3,
            },
        }
    }
}

/// `max(0.4, (100 - preparedness) / 50)`; preparedness is clamped to 0..=100.
pub fn preparedness_multiplier(preparedness: Option<u8>) -> f64 {
    let p = preparedness.unwrap_or(DEFAULT_PREPAREDNESS).min(100) as f64;
    ((100.0 - p) / 50.0).max(MIN_MULTIPLIER)
}

/// Revision still owed for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionDemand {
    pub exam_id: String,
    pub subject: String,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub total_minutes: u32,
    pub slot_minutes: u32,
    pub max_slots_per_day: u32,
    pub remaining_slots: u32,
}

impl RevisionDemand {
    pub fn for_exam(exam: &Exam) -> Self {
        let profile = exam.exam_type.profile();
        let total_minutes =
            (profile.base_minutes as f64 * preparedness_multiplier(exam.preparedness)).round() as u32;
        Self {
            exam_id: exam.id.clone(),
            subject: exam.display_subject().to_string(),
            exam_type: exam.exam_type,
            exam_date: exam.date,
            total_minutes,
            slot_minutes: profile.slot_minutes,
            max_slots_per_day: profile.max_slots_per_day,
            remaining_slots: total_minutes.div_ceil(profile.slot_minutes),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.remaining_slots == 0
    }

    fn priority(&self) -> u8 {
        self.exam_type.profile().priority
    }
}

#[derive(Debug, Default)]
pub struct RevisionAllocation {
    pub buckets: BTreeMap<NaiveDate, Bucket<PlannedRevisionSlot>>,
    pub summaries: Vec<RevisionSummary>,
    pub unscheduled: Vec<Unscheduled>,
}

/// Per (demand, date) usage: slot items placed and slot-equivalents
/// counted against the daily cap.
#[derive(Debug, Default, Clone, Copy)]
struct DayUse {
    items: u32,
    cap_used: u32,
}

struct SlotEngine<'a> {
    demands: Vec<RevisionDemand>,
    placed_minutes: Vec<u32>,
    slot_count: Vec<u32>,
    usage: BTreeMap<(usize, NaiveDate), DayUse>,
    buckets: BTreeMap<NaiveDate, Bucket<PlannedRevisionSlot>>,
    remaining: &'a mut RemainingCapacity,
}

impl<'a> SlotEngine<'a> {
    fn new(demands: Vec<RevisionDemand>, remaining: &'a mut RemainingCapacity) -> Self {
        let n = demands.len();
        let buckets = remaining.dates().map(|d| (d, Bucket::default())).collect();
        Self {
            demands,
            placed_minutes: vec![0; n],
            slot_count: vec![0; n],
            usage: BTreeMap::new(),
            buckets,
            remaining,
        }
    }

    fn place(&mut self, idx: usize, date: NaiveDate, minutes: u32, tier: SlotTier, cap_units: u32) {
        let demand = &self.demands[idx];
        let day_use = self.usage.entry((idx, date)).or_default();
        let slot = PlannedRevisionSlot {
            date,
            exam_id: demand.exam_id.clone(),
            subject: demand.subject.clone(),
            exam_type: demand.exam_type,
            minutes,
            label: tier.label(&demand.subject),
            tier,
            seq: day_use.items,
        };
        day_use.items += 1;
        day_use.cap_used += cap_units;

        self.remaining.consume(date, minutes);
        self.placed_minutes[idx] += minutes;
        self.slot_count[idx] += 1;
        if let Some(bucket) = self.buckets.get_mut(&date) {
            bucket.push(slot);
        }
    }

    fn cap_used(&self, idx: usize, date: NaiveDate) -> u32 {
        self.usage.get(&(idx, date)).map_or(0, |u| u.cap_used)
    }

    /// Phase 0: reserve the day before each exam.
    fn lock_final_days(&mut self) {
        for idx in 0..self.demands.len() {
            let demand = &self.demands[idx];
            if demand.is_satisfied() {
                continue;
            }
            let profile = demand.exam_type.profile();
            let day_before = add_days(demand.exam_date, -1);
            match self.remaining.get(day_before) {
                Some(free) if free > 0 => {
                    let units = profile.lock_minutes.div_ceil(demand.slot_minutes);
                    self.place(idx, day_before, profile.lock_minutes, SlotTier::Final, units);
                    let demand = &mut self.demands[idx];
                    demand.remaining_slots = demand.remaining_slots.saturating_sub(units);
                }
                _ => {
                    tracing::debug!(exam_id = %demand.exam_id, %day_before, "final lock skipped");
                }
            }
        }
    }

    /// Phase A: round-robin by urgency until a full pass places nothing.
    fn greedy_fill(&mut self) {
        let dates: Vec<NaiveDate> = self.remaining.dates().collect();
        // every productive pass places at least one slot
        let pass_cap = self.demands.iter().map(|d| d.remaining_slots as usize).sum::<usize>() + 1;

        for pass in 0..pass_cap {
            let mut placed_any = false;
            for &date in &dates {
                let free = self.remaining.get(date).unwrap_or(0);
                if free <= 0 {
                    continue;
                }
                let best = (0..self.demands.len())
                    .filter(|&i| {
                        let d = &self.demands[i];
                        d.remaining_slots > 0
                            && date < d.exam_date
                            && d.slot_minutes as i64 <= free
                            && self.cap_used(i, date) < d.max_slots_per_day
                    })
                    .min_by_key(|&i| {
                        let d = &self.demands[i];
                        (days_between(date, d.exam_date), Reverse(d.priority()), i)
                    });

                if let Some(idx) = best {
                    let minutes = self.demands[idx].slot_minutes;
                    self.place(idx, date, minutes, SlotTier::Revision, 1);
                    self.demands[idx].remaining_slots -= 1;
                    placed_any = true;
                }
            }
            if !placed_any {
                tracing::debug!(passes = pass + 1, "revision fill reached fixed point");
                return;
            }
        }
        tracing::warn!(pass_cap, "revision fill hit pass cap");
    }

    /// Phase B: force the rest onto the last day before each exam.
    fn cram_overflow(&mut self) {
        for idx in 0..self.demands.len() {
            let demand = &self.demands[idx];
            let shortfall = demand.total_minutes.saturating_sub(self.placed_minutes[idx]);
            // the golden lock deducts whole slot-equivalents, which can leave
            // placed minutes short of the total
            let needed = demand
                .remaining_slots
                .max(shortfall.div_ceil(demand.slot_minutes));
            if needed == 0 {
                continue;
            }
            let exam_date = demand.exam_date;
            let Some(last) = self.remaining.dates().rev().find(|d| *d < exam_date) else {
                continue;
            };
            tracing::debug!(exam_id = %demand.exam_id, %last, needed, "cramming overflow slots");
            let minutes = demand.slot_minutes;
            for _ in 0..needed {
                self.place(idx, last, minutes, SlotTier::ExtraPrep, 1);
            }
            self.demands[idx].remaining_slots = 0;
        }
    }

    fn finish(self, unscheduled: Vec<Unscheduled>) -> RevisionAllocation {
        let summaries = self
            .demands
            .iter()
            .enumerate()
            .map(|(i, d)| RevisionSummary {
                exam_id: d.exam_id.clone(),
                subject: d.subject.clone(),
                exam_type: d.exam_type,
                total_minutes: d.total_minutes,
                placed_minutes: self.placed_minutes[i],
                slot_count: self.slot_count[i],
            })
            .collect();
        RevisionAllocation {
            buckets: self.buckets,
            summaries,
            unscheduled,
        }
    }
}

/// Demands for every exam still ahead of `today`, most urgent first.
///
/// Exams dated today or earlier are returned separately: no day before them
/// remains.
pub fn revision_demands(exams: &[Exam], today: NaiveDate) -> (Vec<RevisionDemand>, Vec<Unscheduled>) {
    let mut demands = Vec::new();
    let mut unscheduled = Vec::new();
    for exam in exams {
        let demand = RevisionDemand::for_exam(exam);
        if exam.date <= today {
            unscheduled.push(Unscheduled {
                id: exam.id.clone(),
                name: demand.subject.clone(),
                minutes: demand.total_minutes,
                reason: UnscheduledReason::ExamPassed,
            });
        } else {
            demands.push(demand);
        }
    }
    // stable: equal date and type keep input order
    demands.sort_by_key(|d| (d.exam_date, Reverse(d.priority())));
    (demands, unscheduled)
}

pub fn allocate_revision(exams: &[Exam], today: NaiveDate, remaining: &mut RemainingCapacity) -> RevisionAllocation {
    let (demands, unscheduled) = revision_demands(exams, today);
    let mut engine = SlotEngine::new(demands, remaining);
    engine.lock_final_days();
    engine.greedy_fill();
    engine.cram_overflow();
    engine.finish(unscheduled)
}
