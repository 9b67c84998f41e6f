//! # Snapshot History
//!
//! Linear undo/redo over full page exports.
//!
//! ## Design
//!
//! - The stack is seeded with the export taken on attach, so it is never
//!   empty and index 0 is the origin
//! - Every `page-changed` event appends one snapshot; edits made after an
//!   undo drop the forward branch first
//! - Undo/redo reload the page with a copy of the target snapshot. Reloads
//!   emit `page-reloaded`, which history ignores, so replays are never
//!   recorded as edits
//! - `max_levels` caps the stack by discarding the oldest snapshots
//! - Runtime assets survive replays; they are swapped by the host, not edited
//!
//! ```text
//! records: [s0, s1, s2, s3]      pre_step ×2      [s0, s1, s2, s3]
//!                       ↑ index  ───────────→          ↑ index
//!
//! new edit ──→ [s0, s1, s4]
//!                       ↑ index
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let history = History::attach(&page, 100);
//! page.delete_node_by_id("n1")?;      // recorded
//! history.pre_step(&mut page)?;       // n1 is back
//! history.next_step(&mut page)?;      // n1 is gone again
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use lowcode_model::{topics, Page, PageSchema, SubscriptionId};
use tracing::debug;

use crate::errors::EngineResult;

#[derive(Debug)]
struct Timeline {
    records: Vec<PageSchema>,
    index: usize,
    max_levels: usize,
    origin: PageSchema,
}

impl Timeline {
    fn seeded(origin: PageSchema, max_levels: usize) -> Self {
        Self {
            records: vec![origin.clone()],
            index: 0,
            max_levels,
            origin,
        }
    }

    fn push(&mut self, snapshot: PageSchema) {
        self.records.truncate(self.index + 1);
        self.records.push(snapshot);

        if self.max_levels > 0 && self.records.len() > self.max_levels {
            let excess = self.records.len() - self.max_levels;
            self.records.drain(..excess);
        }
        self.index = self.records.len() - 1;
        debug!("history step {} recorded", self.index);
    }
}

/// Undo/redo engine bound to one page
#[derive(Debug)]
pub struct History {
    timeline: Rc<RefCell<Timeline>>,
    subscription: Option<SubscriptionId>,
}

impl History {
    /// Seed with the current export and record every later page change
    pub fn attach(page: &Page, max_levels: usize) -> Self {
        let timeline = Rc::new(RefCell::new(Timeline::seeded(page.export(), max_levels)));

        let recorder = Rc::clone(&timeline);
        let subscription = page.on(topics::PAGE_CHANGED, move |_, page| {
            recorder.borrow_mut().push(page.export());
        });

        Self {
            timeline,
            subscription: Some(subscription),
        }
    }

    /// Capture the current export as a new step
    pub fn add_step(&self, page: &Page) {
        self.timeline.borrow_mut().push(page.export());
    }

    /// Roll back one step. Returns false at the origin.
    pub fn pre_step(&self, page: &mut Page) -> EngineResult<bool> {
        let snapshot = {
            let mut timeline = self.timeline.borrow_mut();
            if timeline.index == 0 {
                return Ok(false);
            }
            timeline.index -= 1;
            debug!("history rolled back to step {}", timeline.index);
            timeline.records[timeline.index].clone()
        };
        self.replay(page, snapshot)?;
        Ok(true)
    }

    /// Roll forward one step. Returns false at the head.
    pub fn next_step(&self, page: &mut Page) -> EngineResult<bool> {
        let snapshot = {
            let mut timeline = self.timeline.borrow_mut();
            if timeline.index + 1 >= timeline.records.len() {
                return Ok(false);
            }
            timeline.index += 1;
            debug!("history rolled forward to step {}", timeline.index);
            timeline.records[timeline.index].clone()
        };
        self.replay(page, snapshot)?;
        Ok(true)
    }

    /// Reload the first captured snapshot and discard all other steps
    pub fn reset(&self, page: &mut Page) -> EngineResult<()> {
        let origin = {
            let mut timeline = self.timeline.borrow_mut();
            let origin = timeline.origin.clone();
            let max_levels = timeline.max_levels;
            *timeline = Timeline::seeded(origin.clone(), max_levels);
            origin
        };
        debug!("history reset");
        self.replay(page, origin)
    }

    pub fn can_go_pre_step(&self) -> bool {
        self.timeline.borrow().index > 0
    }

    pub fn can_go_next_step(&self) -> bool {
        let timeline = self.timeline.borrow();
        timeline.index + 1 < timeline.records.len()
    }

    pub fn current_index(&self) -> usize {
        self.timeline.borrow().index
    }

    pub fn len(&self) -> usize {
        self.timeline.borrow().records.len()
    }

    /// Always false: the stack keeps at least the origin
    pub fn is_empty(&self) -> bool {
        self.timeline.borrow().records.is_empty()
    }

    pub fn records(&self) -> Ref<'_, [PageSchema]> {
        Ref::map(self.timeline.borrow(), |t| t.records.as_slice())
    }

    pub fn max_levels(&self) -> usize {
        self.timeline.borrow().max_levels
    }

    /// Stop recording. Returns false if already detached.
    pub fn detach(&mut self, page: &Page) -> bool {
        match self.subscription.take() {
            Some(id) => page.off(id),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Runtime assets are host state, not history: the page keeps the
    /// assets it had before the replay
    fn replay(&self, page: &mut Page, snapshot: PageSchema) -> EngineResult<()> {
        let assets = page.assets().to_vec();
        page.reload(snapshot)?;
        if page.assets() != assets.as_slice() {
            page.set_assets(assets);
        }
        Ok(())
    }
}
